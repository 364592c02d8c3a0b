//! Signal card ranking.
//!
//! Ranking runs in two stages: [`score_cards`] produces `(card, score)` pairs
//! and [`project_signals`] strips the score for the public contract. The score
//! only orders cards; it is never part of the output.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::{activation_costs, has_recurring_trigger};
use crate::card::CommanderProfile;
use crate::classify::CardProfile;
use crate::patterns::{Marker, Role};

/// Each notable tag is worth more than any single curve or synergy bonus.
const TAG_WEIGHT: f64 = 2.5;
/// Higher mana value cards tend to be the deck's payoffs, capped so a
/// 10-drop doesn't outrank a cheap engine.
const CURVE_BONUS_CAP: f64 = 3.0;
const CURVE_BONUS_FLOOR_MV: f64 = 2.0;
const SYNERGY_WEIGHT: f64 = 2.0;
const ENGINE_WEIGHT: f64 = 1.5;

/// The fixed tag alphabet surfaced on signal cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignalTag {
    Spot,
    Counters,
    Wipes,
    Token,
    Copying,
    CastTrigger,
    ChooseModes,
    Protection,
    Blink,
}

impl SignalTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalTag::Spot => "spot",
            SignalTag::Counters => "counters",
            SignalTag::Wipes => "wipes",
            SignalTag::Token => "token",
            SignalTag::Copying => "copying",
            SignalTag::CastTrigger => "cast_trigger",
            SignalTag::ChooseModes => "choose_modes",
            SignalTag::Protection => "protection",
            SignalTag::Blink => "blink",
        }
    }
}

pub fn signal_tags(profile: &CardProfile<'_>) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    let role_tags = [
        (Role::Spot, SignalTag::Spot),
        (Role::Counters, SignalTag::Counters),
        (Role::Wipes, SignalTag::Wipes),
        (Role::Token, SignalTag::Token),
        (Role::Copying, SignalTag::Copying),
    ];
    for (role, tag) in role_tags {
        if profile.has(role) {
            tags.push(tag);
        }
    }
    if profile.markers.contains(&Marker::CastTrigger) {
        tags.push(SignalTag::CastTrigger);
    }
    if profile.markers.contains(&Marker::ChooseModes) {
        tags.push(SignalTag::ChooseModes);
    }
    if profile.has(Role::Protection) {
        tags.push(SignalTag::Protection);
    }
    if profile.has(Role::Blink) {
        tags.push(SignalTag::Blink);
    }
    tags
}

/// A commander theme and how to spot it in card text.
struct Motif {
    tag: Option<SignalTag>,
    pattern: Regex,
}

static MOTIFS: Lazy<Vec<Motif>> = Lazy::new(|| {
    [
        (Some(SignalTag::Token), r"\btokens?\b"),
        (None, r"\bsacrific(?:e|es|ed)\b"),
        (Some(SignalTag::Copying), r"\bcop(?:y|ies)\b"),
        (Some(SignalTag::Blink), r"\bexile [^.]*?\breturn\b[^.]*?\bbattlefield\b|\bblink\b|\bflicker\b"),
        (None, r"\+1/\+1 counters?"),
        (None, r"-1/-1 counters?"),
        (None, r"\b(?:loyalty|energy|experience|poison) counters?\b"),
        (None, r"\bgraveyards?\b"),
        (None, r"\blandfall\b"),
        (None, r"\bartifacts?\b"),
        (None, r"\benchantments?\b"),
        (Some(SignalTag::CastTrigger), r"\bwhenever you cast\b"),
        (Some(SignalTag::Counters), r"\bcounter target spell\b"),
    ]
    .into_iter()
    .map(|(tag, pattern)| Motif {
        tag,
        pattern: Regex::new(pattern).expect("commander motif pattern is valid"),
    })
    .collect()
});

/// Motifs present in the commander's own text.
#[derive(Debug, Clone, Default)]
pub struct CommanderMotifs {
    indices: Vec<usize>,
}

impl CommanderMotifs {
    pub fn extract(commander: Option<&CommanderProfile>) -> Self {
        let Some(commander) = commander else {
            return Self::default();
        };
        let indices = MOTIFS
            .iter()
            .enumerate()
            .filter(|(_, motif)| motif.pattern.is_match(&commander.lower_text))
            .map(|(index, _)| index)
            .collect();
        Self { indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether a card's tags or text overlap any commander motif.
    pub fn overlaps(&self, tags: &[SignalTag], lower_text: &str) -> bool {
        self.indices.iter().any(|&index| {
            let motif = &MOTIFS[index];
            motif.tag.is_some_and(|tag| tags.contains(&tag)) || motif.pattern.is_match(lower_text)
        })
    }
}

/// Token makers with a recurring trigger, or anything with a repeatable
/// activated ability.
pub fn is_engine(profile: &CardProfile<'_>) -> bool {
    let text = &profile.card.lower_text;
    (profile.has(Role::Token) && has_recurring_trigger(text)) || !activation_costs(text).is_empty()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCard {
    pub name: String,
    pub mana_value: f64,
    pub type_line: String,
    pub tags: Vec<SignalTag>,
    pub score: f64,
}

pub fn score_card(profile: &CardProfile<'_>, motifs: &CommanderMotifs) -> ScoredCard {
    let card = profile.card;
    let tags = signal_tags(profile);
    let curve = (card.mana_value - CURVE_BONUS_FLOOR_MV).clamp(0.0, CURVE_BONUS_CAP);
    let synergy = if motifs.overlaps(&tags, &card.lower_text) { 1.0 } else { 0.0 };
    let engine = if is_engine(profile) { 1.0 } else { 0.0 };
    let score = TAG_WEIGHT * tags.len() as f64
        + curve
        + SYNERGY_WEIGHT * synergy
        + ENGINE_WEIGHT * engine
        + (1.0 + card.count as f64).ln();

    ScoredCard {
        name: card.name.clone(),
        mana_value: card.mana_value,
        type_line: card.type_line.clone(),
        tags,
        score,
    }
}

/// Scores every profile and returns the best `limit`, highest first. Ties
/// break by name so the order is stable.
pub fn score_cards(
    profiles: &[CardProfile<'_>],
    motifs: &CommanderMotifs,
    limit: usize,
) -> Vec<ScoredCard> {
    let mut scored: Vec<ScoredCard> = profiles
        .iter()
        .map(|profile| score_card(profile, motifs))
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    scored.truncate(limit);
    scored
}

/// A ranked card as published to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalCard {
    pub name: String,
    pub mana_value: f64,
    #[serde(rename = "type")]
    pub type_line: String,
    pub tags: Vec<SignalTag>,
}

pub fn project_signals(scored: Vec<ScoredCard>) -> Vec<SignalCard> {
    scored
        .into_iter()
        .map(|card| SignalCard {
            name: card.name,
            mana_value: card.mana_value,
            type_line: card.type_line,
            tags: card.tags,
        })
        .collect()
}
