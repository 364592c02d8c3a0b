//! Feature vector assembly.
//!
//! [`build_features`] runs the whole pipeline over one deck snapshot and
//! validates the result before returning it. The computation is pure: the same
//! deck always yields the same vector.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{
    ColorlessPips, DeckAggregate, InteractionProfile, TokenProfile, TutorBreadth, UpkeepLoad,
};
use crate::card::{CommanderProfile, DeckLite, NormalizedDeck, normalize};
use crate::classify::{CardProfile, classify_card, mana_production};
use crate::color::ColorCounts;
use crate::config::EngineConfig;
use crate::error::FeatureError;
use crate::lands::mana_pool;
use crate::mana::{CurveBuckets, effective_mana_value, round2};
use crate::patterns::{Marker, Role};
use crate::signals::{CommanderMotifs, SignalCard, project_signals, score_cards};

pub const FEATURE_SCHEMA_VERSION: &str = "deck-features/v1";

const CARD_TYPES: [&str; 9] = [
    "land",
    "creature",
    "artifact",
    "enchantment",
    "planeswalker",
    "instant",
    "sorcery",
    "battle",
    "kindred",
];

const KEYWORDS: [&str; 25] = [
    "flying",
    "trample",
    "haste",
    "vigilance",
    "lifelink",
    "deathtouch",
    "menace",
    "reach",
    "flash",
    "hexproof",
    "indestructible",
    "ward",
    "first strike",
    "double strike",
    "cascade",
    "storm",
    "convoke",
    "delve",
    "affinity",
    "emerge",
    "improvise",
    "landfall",
    "flashback",
    "cycling",
    "kicker",
];

static KEYWORD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    KEYWORDS
        .iter()
        .map(|keyword| {
            let pattern = format!(r"\b{}\b", regex::escape(keyword));
            (
                *keyword,
                Regex::new(&pattern).expect("keyword pattern is valid"),
            )
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommanderSummary {
    pub name: String,
    pub mana_value: f64,
    #[serde(rename = "type")]
    pub type_line: String,
    pub color_identity: Vec<String>,
}

impl From<&CommanderProfile> for CommanderSummary {
    fn from(commander: &CommanderProfile) -> Self {
        Self {
            name: commander.name.clone(),
            mana_value: commander.mana_value,
            type_line: commander.type_line.clone(),
            color_identity: commander.identity.symbols(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeckMeta {
    pub deck_id: String,
    pub commander: Option<CommanderSummary>,
    pub avg_mana_value: f64,
    pub mainboard_count: u32,
    pub nonland_count: u32,
    pub land_count: u32,
}

/// The versioned per-deck feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeckFeatureVector {
    pub schema_version: String,
    pub meta: DeckMeta,
    pub counts: BTreeMap<String, u32>,
    pub curve: CurveBuckets,
    pub effective_curve: CurveBuckets,
    pub type_counts: BTreeMap<String, u32>,
    pub keyword_histogram: BTreeMap<String, u32>,
    pub interaction_density: f64,
    pub stack_complexity_markers: Vec<String>,
    pub signals: Vec<SignalCard>,
    pub mana_pool: ColorCounts,
    pub coloured_mana_curve: ColorCounts,
    pub interaction: InteractionProfile,
    pub upkeep_load: UpkeepLoad,
    pub c_pips: ColorlessPips,
    pub token_profile: TokenProfile,
    pub tutor_breadth: TutorBreadth,
    pub color_tension_index: ColorCounts,
}

fn ensure_non_negative(field: &str, value: f64) -> Result<(), FeatureError> {
    if !value.is_finite() || value < 0.0 {
        return Err(FeatureError::schema(
            field,
            format!("expected a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

fn ensure_colors(field: &str, counts: &ColorCounts) -> Result<(), FeatureError> {
    match counts.first_invalid() {
        Some(color) => Err(FeatureError::schema(
            format!("{field}.{}", color.symbol()),
            format!("expected a finite non-negative number, got {}", counts.get(color)),
        )),
        None => Ok(()),
    }
}

impl DeckFeatureVector {
    /// Checks the invariants downstream consumers rely on.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.schema_version != FEATURE_SCHEMA_VERSION {
            return Err(FeatureError::schema(
                "schema_version",
                format!("expected {FEATURE_SCHEMA_VERSION}, got {}", self.schema_version),
            ));
        }

        ensure_non_negative("meta.avg_mana_value", self.meta.avg_mana_value)?;
        ensure_non_negative("interaction_density", self.interaction_density)?;
        for signal in &self.signals {
            ensure_non_negative("signals.mana_value", signal.mana_value)?;
        }
        ensure_colors("mana_pool", &self.mana_pool)?;
        ensure_colors("coloured_mana_curve", &self.coloured_mana_curve)?;
        ensure_colors("color_tension_index", &self.color_tension_index)?;

        if self.meta.mainboard_count != self.meta.nonland_count.saturating_add(self.meta.land_count) {
            return Err(FeatureError::schema(
                "meta.mainboard_count",
                "must equal nonland_count + land_count",
            ));
        }
        for (field, curve) in [("curve", &self.curve), ("effective_curve", &self.effective_curve)] {
            if curve.total() != self.meta.nonland_count {
                return Err(FeatureError::schema(
                    field,
                    format!(
                        "bucket sum {} does not match nonland count {}",
                        curve.total(),
                        self.meta.nonland_count
                    ),
                ));
            }
        }

        let markers: BTreeSet<&String> = self.stack_complexity_markers.iter().collect();
        if markers.len() != self.stack_complexity_markers.len() {
            return Err(FeatureError::schema(
                "stack_complexity_markers",
                "contains duplicates",
            ));
        }
        Ok(())
    }
}

/// JSON schema describing [`DeckFeatureVector`].
pub fn feature_vector_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(DeckFeatureVector)
}

fn type_counts(deck: &NormalizedDeck) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for card in deck.all_cards() {
        for card_type in CARD_TYPES {
            if card.has_type(card_type) {
                let slot = counts.entry(card_type.to_string()).or_insert(0u32);
                *slot = slot.saturating_add(card.count);
            }
        }
    }
    counts
}

fn keyword_histogram(profiles: &[CardProfile<'_>]) -> BTreeMap<String, u32> {
    let mut histogram = BTreeMap::new();
    for profile in profiles {
        for (keyword, pattern) in KEYWORD_PATTERNS.iter() {
            if pattern.is_match(&profile.card.lower_text) {
                let slot = histogram.entry(keyword.to_string()).or_insert(0u32);
                *slot = slot.saturating_add(profile.card.count);
            }
        }
    }
    histogram
}

fn role_counts(profiles: &[CardProfile<'_>]) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = Role::ALL
        .iter()
        .map(|role| (role.as_str().to_string(), 0))
        .collect();
    for profile in profiles {
        for role in &profile.roles {
            let slot = counts.entry(role.as_str().to_string()).or_insert(0);
            *slot = slot.saturating_add(profile.card.count);
        }
    }
    counts
}

pub fn build_features(deck: &DeckLite) -> Result<DeckFeatureVector, FeatureError> {
    build_features_with(deck, &EngineConfig::default())
}

pub fn build_features_with(
    deck: &DeckLite,
    config: &EngineConfig,
) -> Result<DeckFeatureVector, FeatureError> {
    config.validate()?;
    let normalized = normalize(deck);
    if normalized.lands.is_empty() && normalized.nonlands.is_empty() {
        warn!(deck = %normalized.id, "deck has no mainboard cards");
    }
    let identity = normalized.identity();

    let profiles: Vec<CardProfile<'_>> = normalized
        .nonlands
        .iter()
        .map(|card| classify_card(card, identity))
        .collect();

    let mut curve = CurveBuckets::default();
    let mut effective_curve = CurveBuckets::default();
    let mut mana_value_sum = 0.0;
    let mut aggregate = DeckAggregate::default();
    let mut markers: BTreeSet<Marker> = BTreeSet::new();
    for profile in &profiles {
        let card = profile.card;
        curve.add(card.mana_value, card.count);
        effective_curve.add(effective_mana_value(card.mana_value, &card.lower_text), card.count);
        mana_value_sum += card.mana_value * card.count as f64;
        aggregate.observe(profile);
        markers.extend(profile.markers.iter().copied());
    }
    for land in &normalized.lands {
        aggregate.observe_land(&mana_production(&land.lower_text, identity), land.count);
    }

    let nonland_count = normalized.nonland_count();
    let land_count = normalized.land_count();
    let avg_mana_value = if nonland_count == 0 {
        0.0
    } else {
        round2(mana_value_sum / nonland_count as f64)
    };

    let land_sources = mana_pool(&normalized.lands, identity);
    let motifs = CommanderMotifs::extract(normalized.commander.as_ref());
    let signals = project_signals(score_cards(&profiles, &motifs, config.signal_limit));

    let vector = DeckFeatureVector {
        schema_version: FEATURE_SCHEMA_VERSION.to_string(),
        meta: DeckMeta {
            deck_id: normalized.id.clone(),
            commander: normalized.commander.as_ref().map(CommanderSummary::from),
            avg_mana_value,
            mainboard_count: nonland_count.saturating_add(land_count),
            nonland_count,
            land_count,
        },
        counts: role_counts(&profiles),
        curve,
        effective_curve,
        type_counts: type_counts(&normalized),
        keyword_histogram: keyword_histogram(&profiles),
        interaction_density: aggregate.interaction_density(),
        stack_complexity_markers: markers.iter().map(|m| m.as_str().to_string()).collect(),
        signals,
        mana_pool: land_sources.rounded(),
        coloured_mana_curve: aggregate.coloured_mana_curve.rounded(),
        interaction: aggregate.interaction,
        upkeep_load: aggregate.upkeep_load,
        c_pips: aggregate.c_pips,
        token_profile: aggregate.token_profile,
        tutor_breadth: aggregate.tutor_breadth,
        color_tension_index: aggregate.color_tension(&land_sources),
    };

    vector.validate()?;
    debug!(
        deck = %vector.meta.deck_id,
        nonlands = nonland_count,
        lands = land_count,
        signals = vector.signals.len(),
        "built feature vector"
    );
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardLite, DeckEntry};

    fn entry(count: u32, name: &str, type_line: &str, cost: &str, mv: f64, text: &str) -> DeckEntry {
        DeckEntry {
            count,
            board_section: "mainboard".to_string(),
            card: CardLite {
                name: Some(name.to_string()),
                mana_value: Some(mv),
                mana_cost: Some(cost.to_string()),
                type_line: Some(type_line.to_string()),
                text: Some(text.to_string()),
                color_identity: None,
            },
        }
    }

    fn sample_deck() -> DeckLite {
        DeckLite {
            id: "sample".to_string(),
            commander: None,
            deck_cards: vec![
                entry(1, "Lightning Bolt", "Instant", "{R}", 1.0, "Lightning Bolt deals 3 damage to any target."),
                entry(1, "Delve Draw", "Sorcery", "{4}{U}", 5.0, "Delve\nDraw three cards."),
                entry(2, "Flier", "Creature — Bird", "{1}{U}", 2.0, "Flying"),
                entry(5, "Island", "Basic Land — Island", "", 0.0, ""),
            ],
        }
    }

    #[test]
    fn test_type_counts_and_keywords() {
        let features = build_features(&sample_deck()).expect("features");
        assert_eq!(features.type_counts["land"], 5);
        assert_eq!(features.type_counts["creature"], 2);
        assert_eq!(features.type_counts["instant"], 1);
        assert_eq!(features.keyword_histogram["flying"], 2);
        assert_eq!(features.keyword_histogram["delve"], 1);
        assert!(!features.keyword_histogram.contains_key("trample"));
    }

    #[test]
    fn test_effective_curve_moves_delve_down() {
        let features = build_features(&sample_deck()).expect("features");
        assert_eq!(features.curve.five, 1);
        assert_eq!(features.effective_curve.five, 0);
        assert_eq!(features.effective_curve.three, 1);
        assert_eq!(features.effective_curve.two, 2);
        assert_eq!(features.meta.avg_mana_value, 2.5);
    }

    #[test]
    fn test_counts_include_every_role_key() {
        let features = build_features(&sample_deck()).expect("features");
        assert_eq!(features.counts.len(), Role::ALL.len());
        assert_eq!(features.counts["spot"], 1);
        assert_eq!(features.counts["draw"], 1);
        assert_eq!(features.counts["wipes"], 0);
    }

    #[test]
    fn test_validate_rejects_broken_curve() {
        let mut features = build_features(&sample_deck()).expect("features");
        features.curve.two += 1;
        let err = features.validate().unwrap_err();
        assert!(matches!(err, FeatureError::Schema { ref field, .. } if field == "curve"));
    }

    #[test]
    fn test_validate_rejects_negative_ratio() {
        let mut features = build_features(&sample_deck()).expect("features");
        features.interaction_density = -0.5;
        assert!(features.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_version() {
        let mut features = build_features(&sample_deck()).expect("features");
        features.schema_version = "deck-features/v0".to_string();
        assert!(features.validate().is_err());
    }

    #[test]
    fn test_schema_lists_top_level_fields() {
        let schema = serde_json::to_value(feature_vector_schema()).expect("schema json");
        let properties = &schema["properties"];
        for field in ["meta", "curve", "signals", "color_tension_index", "c_pips"] {
            assert!(properties.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_empty_deck_is_all_zero() {
        let deck = DeckLite {
            id: "empty".to_string(),
            ..DeckLite::default()
        };
        let features = build_features(&deck).expect("features");
        assert_eq!(features.meta.mainboard_count, 0);
        assert_eq!(features.interaction_density, 0.0);
        assert_eq!(features.meta.avg_mana_value, 0.0);
        assert!(features.signals.is_empty());
    }
}
