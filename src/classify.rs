//! Per-card classification: semantic roles, complexity markers, and mana
//! production.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::card::CardStack;
use crate::color::{Color, ColorCounts, ColorSet};
use crate::patterns::{MARKER_TABLE, Marker, ROLE_TABLE, Role};

static TAP_ADD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{t\}(?:, [^:\n]*)?: add ([^.\n]*)").expect("tap-add pattern is valid")
});

static ANY_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\badd (?:one|two|three|x|\w+)? ?mana of any (?:one )?colou?r\b")
        .expect("any-color pattern is valid")
});

static MANA_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([wubrgc])\}").expect("mana letter pattern is valid"));

/// Mana one copy of a permanent can produce, in source units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManaProduction {
    pub colors: ColorCounts,
    pub colorless: u32,
    pub any_color: bool,
}

impl ManaProduction {
    pub fn is_source(&self) -> bool {
        self.any_color || self.colorless > 0 || self.colors.total() > 0.0
    }
}

/// Reads "{T}: Add ..." and "add mana of any color" clauses. An any-color
/// source counts once for every color in `identity`, or for all five colors
/// when the identity is empty.
pub fn mana_production(lower_text: &str, identity: ColorSet) -> ManaProduction {
    let mut production = ManaProduction::default();

    for caps in TAP_ADD.captures_iter(lower_text) {
        let Some(clause) = caps.get(1) else {
            continue;
        };
        for letter in MANA_LETTER.captures_iter(clause.as_str()) {
            match letter.get(1).map(|m| m.as_str()) {
                Some("c") => production.colorless += 1,
                Some(symbol) => {
                    if let Some(color) = symbol.chars().next().and_then(Color::from_symbol) {
                        production.colors.add(color, 1.0);
                    }
                }
                None => {}
            }
        }
    }

    if ANY_COLOR.is_match(lower_text) {
        production.any_color = true;
        for color in identity.or_all().iter() {
            production.colors.add(color, 1.0);
        }
    }

    production
}

/// Basic land types on the type line, for lands whose text carries no mana
/// clause (a bare "Forest" row).
pub fn basic_type_colors(card: &CardStack) -> ColorCounts {
    let mut colors = ColorCounts::default();
    for word in card.subtype_words() {
        let color = match word {
            "plains" => Color::White,
            "island" => Color::Blue,
            "swamp" => Color::Black,
            "mountain" => Color::Red,
            "forest" => Color::Green,
            _ => continue,
        };
        colors.add(color, 1.0);
    }
    colors
}

/// Everything the deck-level aggregators need to know about one nonland
/// stack.
#[derive(Debug, Clone)]
pub struct CardProfile<'a> {
    pub card: &'a CardStack,
    pub roles: BTreeSet<Role>,
    pub markers: BTreeSet<Marker>,
    pub production: ManaProduction,
}

impl CardProfile<'_> {
    pub fn has(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Artifact and creature mana sources count toward colored fixing.
    pub fn is_nonland_source(&self) -> bool {
        self.has(Role::Rocks) || self.has(Role::Dorks)
    }
}

pub fn classify_card(card: &CardStack, identity: ColorSet) -> CardProfile<'_> {
    let mut roles = ROLE_TABLE.hits(&card.lower_text);
    let markers = MARKER_TABLE.hits(&card.lower_text);
    let production = mana_production(&card.lower_text, identity);

    if production.is_source() {
        if card.has_type("creature") {
            roles.insert(Role::Dorks);
            roles.insert(Role::Ramp);
        } else if card.has_type("artifact") {
            roles.insert(Role::Rocks);
            roles.insert(Role::Ramp);
        }
    }

    CardProfile {
        card,
        roles,
        markers,
        production,
    }
}
