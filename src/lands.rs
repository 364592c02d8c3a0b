//! Land signal curation.
//!
//! Lands are tagged from their text (plus a short list of name overrides),
//! scored with per-tag weights and a diminishing count multiplier, then
//! deduplicated, thresholded and capped. Fetch lands only clear the bar in
//! decks whose nonland text cares about lands entering play.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::card::{CardStack, DeckLite, NormalizedDeck, normalize};
use crate::classify::{basic_type_colors, mana_production};
use crate::color::{ColorCounts, ColorSet};
use crate::config::EngineConfig;
use crate::error::FeatureError;
use crate::mana::round2;
use crate::patterns::{LAND_MOTIF_TABLE, RuleSpec, RuleTable};

/// A single motif hit contributes at most this much to the land-context score.
const MOTIF_HIT_CAP: f64 = 3.0;
/// Copies past four add nothing to a land's multiplier.
const COUNT_MULTIPLIER_CAP: u32 = 4;
const COUNT_MULTIPLIER_SLOPE: f64 = 0.35;
/// Fetch bonus per point of land-context score, and its ceiling.
const FETCH_CONTEXT_FACTOR: f64 = 0.9;
const FETCH_CONTEXT_CAP: f64 = 2.2;
/// Anything below this is noise and is zeroed.
const SCORE_FLOOR: f64 = 0.6;
// Trivial ETB clauses on untagged lands.
const ENTERS_TAPPED_PENALTY: f64 = 0.3;
const SCRY_ONE_PENALTY: f64 = 0.2;
const GAIN_ONE_PENALTY: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LandTag {
    Draw,
    RepeatableDraw,
    LandTutor,
    Fetch,
    GraveyardHate,
    RecursionTop,
    RecursionBattlefield,
    BecomesCreature,
    TokenEngine,
    BlinkProtection,
    AntiCounter,
    EvasionGrant,
    ColorShift,
    DevotionBurst,
    UntapSynergy,
    DamageRemoval,
    CommanderSupport,
    HandSize,
    BounceControl,
}

impl LandTag {
    /// Base weight of the tag. Token engines and burst mana change games on
    /// their own; commander support and hand size are mild.
    pub fn weight(self) -> f64 {
        match self {
            LandTag::Draw => 2.6,
            LandTag::RepeatableDraw => 3.2,
            LandTag::LandTutor => 2.8,
            LandTag::Fetch => 2.0,
            LandTag::GraveyardHate => 3.0,
            LandTag::RecursionTop => 2.8,
            LandTag::RecursionBattlefield => 3.2,
            LandTag::BecomesCreature => 2.8,
            LandTag::TokenEngine => 3.8,
            LandTag::BlinkProtection => 2.8,
            LandTag::AntiCounter => 3.0,
            LandTag::EvasionGrant => 2.4,
            LandTag::ColorShift => 3.0,
            LandTag::DevotionBurst => 4.0,
            LandTag::UntapSynergy => 2.6,
            LandTag::DamageRemoval => 3.0,
            // Just enough for a lone Command Tower to clear the default bar.
            LandTag::CommanderSupport => 2.2,
            LandTag::HandSize => 2.2,
            LandTag::BounceControl => 2.6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LandTag::Draw => "card draw",
            LandTag::RepeatableDraw => "repeatable card draw",
            LandTag::LandTutor => "land tutor",
            LandTag::Fetch => "fetch",
            LandTag::GraveyardHate => "graveyard hate",
            LandTag::RecursionTop => "recursion to library top",
            LandTag::RecursionBattlefield => "recursion",
            LandTag::BecomesCreature => "becomes a creature",
            LandTag::TokenEngine => "token engine",
            LandTag::BlinkProtection => "blink/phase protection",
            LandTag::AntiCounter => "uncounterable spells",
            LandTag::EvasionGrant => "grants evasion",
            LandTag::ColorShift => "color/type shifting",
            LandTag::DevotionBurst => "burst mana",
            LandTag::UntapSynergy => "untap synergy",
            LandTag::DamageRemoval => "removal",
            LandTag::CommanderSupport => "commander support",
            LandTag::HandSize => "hand size",
            LandTag::BounceControl => "bounce",
        }
    }
}

const SELF_SACRIFICE_SEARCH: &str = r"sacrifice [^:.]*: search your library";

const LAND_TAG_RULES: &[RuleSpec<LandTag>] = &[
    RuleSpec {
        key: LandTag::Draw,
        pattern: r"\bdraws? (?:a|an|one|two|three|x|\d+) cards?\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::RepeatableDraw,
        pattern: r"\{t\}[^:\n]*:[^.\n]*\bdraws? (?:a|an|one|two|x|\d+) cards?\b",
        exclude: Some(r"\{t\}, sacrifice [^:\n]*:[^.\n]*\bdraw"),
    },
    RuleSpec {
        key: LandTag::LandTutor,
        pattern: r"search your library for [^.]*?\blands?\b",
        exclude: Some(SELF_SACRIFICE_SEARCH),
    },
    RuleSpec {
        key: LandTag::Fetch,
        pattern: SELF_SACRIFICE_SEARCH,
        exclude: None,
    },
    RuleSpec {
        key: LandTag::GraveyardHate,
        pattern: r"\bexile [^.]*?graveyards?\b",
        exclude: Some(r"from your graveyard"),
    },
    RuleSpec {
        key: LandTag::RecursionTop,
        pattern: r"from your graveyard on top of your library|on top of your library from your graveyard",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::RecursionBattlefield,
        pattern: r"from your graveyard (?:to|onto) the battlefield|\breturn target [^.]*?card from your graveyard\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::BecomesCreature,
        pattern: r"\bbecomes? an? [^.]*?\bcreature\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::TokenEngine,
        pattern: r"\bcreates? [^.]*?\btokens?\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::BlinkProtection,
        pattern: r"\bphases? out\b|\bexile (?:another )?target [^.]*?you control[^\n]*?\breturn\b|\bgains? (?:hexproof|indestructible)\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::AntiCounter,
        pattern: r"\bcan't be countered\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::EvasionGrant,
        pattern: r"\bcan't be blocked\b|\bgains? (?:flying|trample|menace|shadow|fear|intimidate|horsemanship)\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::ColorShift,
        pattern: r"\bbecomes? the (?:color|colors|basic land type|creature type)s? of your choice\b|\bis (?:every|a|an) (?:basic land type|swamp|forest|island|mountain|plains) in addition\b|\bare (?:swamps|forests|islands|mountains|plains) in addition\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::DevotionBurst,
        pattern: r"\bdevotion\b|\badd [^.]*?\bfor each\b|\badd an amount of\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::UntapSynergy,
        pattern: r"\buntap (?:target|another target|all|each|up to|two|three)\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::DamageRemoval,
        pattern: r"\bdeals? (?:\d+|x) damage to (?:any target|target|each)\b|\b(?:destroy|exile) target (?:\w+ )?(?:creature|permanent|artifact|enchantment|planeswalker|land)\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::CommanderSupport,
        pattern: r"\bcommander\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::HandSize,
        pattern: r"\bmaximum hand size\b",
        exclude: None,
    },
    RuleSpec {
        key: LandTag::BounceControl,
        pattern: r"\breturn (?:target|another target|up to one target) [^.]*?to (?:its|their) owner'?s'? hands?\b",
        exclude: None,
    },
];

static LAND_TAG_TABLE: Lazy<RuleTable<LandTag>> =
    Lazy::new(|| RuleTable::compile(LAND_TAG_RULES));

/// Famous utility lands whose text is phrased too unusually for the rules.
const NAME_OVERRIDES: &[(&str, &[LandTag])] = &[
    ("nykthos, shrine to nyx", &[LandTag::DevotionBurst]),
    ("cabal coffers", &[LandTag::DevotionBurst]),
    ("cabal stronghold", &[LandTag::DevotionBurst]),
    ("gaea's cradle", &[LandTag::DevotionBurst]),
    ("itlimoc, cradle of the sun", &[LandTag::DevotionBurst]),
    ("serra's sanctum", &[LandTag::DevotionBurst]),
    ("tolarian academy", &[LandTag::DevotionBurst]),
    ("urborg, tomb of yawgmoth", &[LandTag::ColorShift]),
    ("yavimaya, cradle of growth", &[LandTag::ColorShift]),
    ("prismatic omen", &[LandTag::ColorShift]),
    ("bojuka bog", &[LandTag::GraveyardHate]),
    ("scavenger grounds", &[LandTag::GraveyardHate]),
    ("cavern of souls", &[LandTag::AntiCounter]),
    ("boseiju, who shelters all", &[LandTag::AntiCounter]),
    ("command tower", &[LandTag::CommanderSupport]),
];

pub fn land_tags(land: &CardStack) -> BTreeSet<LandTag> {
    let mut tags = LAND_TAG_TABLE.hits(&land.lower_text);
    let lower_name = land.name.to_lowercase();
    for (name, forced) in NAME_OVERRIDES {
        if lower_name == *name {
            tags.extend(forced.iter().copied());
        }
    }
    tags
}

/// How much the deck's nonland text cares about lands. Every motif hit on a
/// stack adds `min(3, ln(2 + count))`.
pub fn land_context_score(nonlands: &[CardStack]) -> f64 {
    let mut score = 0.0;
    for card in nonlands {
        let hits = LAND_MOTIF_TABLE.hits(&card.lower_text);
        let per_hit = (2.0 + card.count as f64).ln().min(MOTIF_HIT_CAP);
        score += per_hit * hits.len() as f64;
    }
    score
}

fn trivial_clause_penalty(lower_text: &str) -> f64 {
    let mut penalty = 0.0;
    if lower_text.contains("enters tapped") || lower_text.contains("enters the battlefield tapped") {
        penalty += ENTERS_TAPPED_PENALTY;
    }
    if lower_text.contains("scry 1") {
        penalty += SCRY_ONE_PENALTY;
    }
    if lower_text.contains("gain 1 life") {
        penalty += GAIN_ONE_PENALTY;
    }
    penalty
}

/// Score one land stack, rounded to two decimals.
pub fn score_land(tags: &BTreeSet<LandTag>, count: u32, lower_text: &str, context_score: f64) -> f64 {
    let mut score = if tags.is_empty() {
        -trivial_clause_penalty(lower_text)
    } else {
        let base: f64 = tags.iter().map(|tag| tag.weight()).sum();
        let copies = count.min(COUNT_MULTIPLIER_CAP) as f64;
        base * (1.0 + COUNT_MULTIPLIER_SLOPE * (1.0 + copies).ln())
    };

    if tags.len() == 1 && tags.contains(&LandTag::Fetch) {
        score += (FETCH_CONTEXT_FACTOR * context_score).min(FETCH_CONTEXT_CAP);
    }

    if score < SCORE_FLOOR {
        return 0.0;
    }
    round2(score)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLand {
    pub name: String,
    pub count: u32,
    pub tags: BTreeSet<LandTag>,
    pub score: f64,
}

pub fn score_lands(lands: &[CardStack], context_score: f64) -> Vec<ScoredLand> {
    lands
        .iter()
        .map(|land| {
            let tags = land_tags(land);
            let score = score_land(&tags, land.count, &land.lower_text, context_score);
            ScoredLand {
                name: land.name.clone(),
                count: land.count,
                tags,
                score,
            }
        })
        .collect()
}

/// A land surfaced to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalLand {
    pub name: String,
    pub count: u32,
    pub tags: Vec<LandTag>,
    pub why: String,
}

pub fn explain(tags: &[LandTag]) -> String {
    tags.iter()
        .map(|tag| tag.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Merge by case-insensitive name (summed counts, max score, unioned tags;
/// the first row's spelling is kept), drop untagged or sub-threshold lands,
/// sort by score and cap.
pub fn curate_lands(
    scored: Vec<ScoredLand>,
    context_score: f64,
    config: &EngineConfig,
) -> Vec<SignalLand> {
    let threshold = config.land_threshold(context_score);

    let mut merged: BTreeMap<String, ScoredLand> = BTreeMap::new();
    for land in scored {
        let key = land.name.to_lowercase();
        match merged.get_mut(&key) {
            Some(existing) => {
                existing.count = existing.count.saturating_add(land.count);
                existing.score = existing.score.max(land.score);
                existing.tags.extend(land.tags);
            }
            None => {
                merged.insert(key, land);
            }
        }
    }

    let mut kept: Vec<ScoredLand> = merged
        .into_values()
        .filter(|land| !land.tags.is_empty() && land.score >= threshold)
        .collect();
    kept.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    kept.truncate(config.signal_land_cap);

    kept.into_iter()
        .map(|land| {
            let tags: Vec<LandTag> = land.tags.into_iter().collect();
            SignalLand {
                name: land.name,
                count: land.count,
                why: explain(&tags),
                tags,
            }
        })
        .collect()
}

/// Colored sources contributed by lands alone. Lands with no mana clause in
/// their text fall back to the basic land types on their type line.
pub fn mana_pool(lands: &[CardStack], identity: ColorSet) -> ColorCounts {
    let mut pool = ColorCounts::default();
    for land in lands {
        let production = mana_production(&land.lower_text, identity);
        let colors = if production.colors.total() > 0.0 {
            production.colors
        } else {
            basic_type_colors(land)
        };
        pool.add_scaled(&colors, land.count as f64);
    }
    pool
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LandCompression {
    pub mana_pool: ColorCounts,
    pub signal_lands: Vec<SignalLand>,
    pub land_context_score: f64,
}

fn compress_normalized(deck: &NormalizedDeck, config: &EngineConfig) -> LandCompression {
    let context_score = land_context_score(&deck.nonlands);
    let scored = score_lands(&deck.lands, context_score);
    let signal_lands = curate_lands(scored, context_score, config);
    debug!(
        deck = %deck.id,
        lands = deck.lands.len(),
        context_score,
        signal_lands = signal_lands.len(),
        "compressed lands"
    );

    LandCompression {
        mana_pool: mana_pool(&deck.lands, deck.identity()),
        signal_lands,
        land_context_score: round2(context_score),
    }
}

pub fn compress_lands(deck: &DeckLite) -> Result<LandCompression, FeatureError> {
    compress_lands_with(deck, &EngineConfig::default())
}

pub fn compress_lands_with(
    deck: &DeckLite,
    config: &EngineConfig,
) -> Result<LandCompression, FeatureError> {
    config.validate()?;
    Ok(compress_normalized(&normalize(deck), config))
}
