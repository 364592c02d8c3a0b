//! Input shapes for decklists and the normalizer that turns them into
//! coalesced, lowercased card stacks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::ColorSet;

/// Read-only projection of a card as supplied by storage. Every field may be
/// missing or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CardLite {
    pub name: Option<String>,
    pub mana_value: Option<f64>,
    pub mana_cost: Option<String>,
    #[serde(rename = "type")]
    pub type_line: Option<String>,
    pub text: Option<String>,
    pub color_identity: Option<Vec<String>>,
}

impl CardLite {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn mana_cost(&self) -> &str {
        self.mana_cost.as_deref().unwrap_or("")
    }

    pub fn type_line(&self) -> &str {
        self.type_line.as_deref().unwrap_or("")
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Mana value coalesced to a finite, non-negative number.
    pub fn mana_value(&self) -> f64 {
        match self.mana_value {
            Some(value) if value.is_finite() && value > 0.0 => value,
            _ => 0.0,
        }
    }

    pub fn color_identity(&self) -> &[String] {
        self.color_identity.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeckEntry {
    pub count: u32,
    #[serde(default = "default_board_section")]
    pub board_section: String,
    pub card: CardLite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeckLite {
    pub id: String,
    #[serde(default)]
    pub commander: Option<CardLite>,
    #[serde(default)]
    pub deck_cards: Vec<DeckEntry>,
}

pub const MAINBOARD: &str = "mainboard";

fn default_board_section() -> String {
    MAINBOARD.to_string()
}

/// One mainboard entry after null coalescing.
#[derive(Debug, Clone, PartialEq)]
pub struct CardStack {
    pub name: String,
    pub count: u32,
    pub mana_value: f64,
    pub mana_cost: String,
    pub type_line: String,
    pub lower_type: String,
    pub lower_text: String,
}

impl CardStack {
    pub fn from_card(card: &CardLite, count: u32) -> Self {
        Self {
            name: card.name().trim().to_string(),
            count,
            mana_value: card.mana_value(),
            mana_cost: card.mana_cost().to_string(),
            type_line: card.type_line().to_string(),
            lower_type: card.type_line().to_lowercase(),
            lower_text: card.text().to_lowercase(),
        }
    }

    /// Card types from the left side of the type line (before the dash).
    pub fn type_words(&self) -> impl Iterator<Item = &str> {
        self.lower_type
            .split(['—', '-'])
            .next()
            .unwrap_or("")
            .split_whitespace()
    }

    pub fn has_type(&self, card_type: &str) -> bool {
        self.type_words().any(|word| word == card_type)
    }

    /// Basic land types named on the right side of the type line.
    pub fn subtype_words(&self) -> impl Iterator<Item = &str> {
        self.lower_type
            .split_once(['—', '-'])
            .map(|(_, rest)| rest)
            .unwrap_or("")
            .split_whitespace()
    }

    pub fn is_land(&self) -> bool {
        self.has_type("land")
    }
}

/// The deck's commander, reduced to what scoring needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CommanderProfile {
    pub name: String,
    pub mana_value: f64,
    pub type_line: String,
    pub lower_text: String,
    pub identity: ColorSet,
}

impl CommanderProfile {
    pub fn from_card(card: &CardLite) -> Self {
        Self {
            name: card.name().trim().to_string(),
            mana_value: card.mana_value(),
            type_line: card.type_line().to_string(),
            lower_text: card.text().to_lowercase(),
            identity: ColorSet::from_identity(card.color_identity()),
        }
    }
}

/// A deck partitioned into mainboard lands and nonlands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedDeck {
    pub id: String,
    pub commander: Option<CommanderProfile>,
    pub lands: Vec<CardStack>,
    pub nonlands: Vec<CardStack>,
}

impl NormalizedDeck {
    /// Colors an "any color" source produces for this deck.
    pub fn identity(&self) -> ColorSet {
        self.commander
            .as_ref()
            .map(|commander| commander.identity)
            .unwrap_or(ColorSet::COLORLESS)
    }

    pub fn nonland_count(&self) -> u32 {
        saturating_total(&self.nonlands)
    }

    pub fn land_count(&self) -> u32 {
        saturating_total(&self.lands)
    }

    pub fn all_cards(&self) -> impl Iterator<Item = &CardStack> {
        self.lands.iter().chain(self.nonlands.iter())
    }
}

fn saturating_total(cards: &[CardStack]) -> u32 {
    cards
        .iter()
        .fold(0u32, |total, card| total.saturating_add(card.count))
}

/// Keeps mainboard entries with a positive count and splits them by type.
pub fn normalize(deck: &DeckLite) -> NormalizedDeck {
    let mut normalized = NormalizedDeck {
        id: deck.id.clone(),
        commander: deck.commander.as_ref().map(CommanderProfile::from_card),
        ..NormalizedDeck::default()
    };

    for entry in &deck.deck_cards {
        if !entry.board_section.trim().eq_ignore_ascii_case(MAINBOARD) {
            continue;
        }
        if entry.count == 0 {
            warn!(deck = %deck.id, card = entry.card.name(), "skipping entry with zero count");
            continue;
        }
        let stack = CardStack::from_card(&entry.card, entry.count);
        if stack.is_land() {
            normalized.lands.push(stack);
        } else {
            normalized.nonlands.push(stack);
        }
    }

    normalized
}
