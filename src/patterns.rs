//! Declarative rule tables over lowercased oracle text.
//!
//! Each table is an ordered list of [`RuleSpec`] records compiled once into a
//! [`RuleTable`]. A key may appear in several records; it matches when any of
//! its records match. Keys are evaluated independently, so one card can carry
//! any number of them.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// One record of a rule table.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec<K> {
    pub key: K,
    pub pattern: &'static str,
    /// Text matching this pattern vetoes the record.
    pub exclude: Option<&'static str>,
}

const fn rule<K>(key: K, pattern: &'static str) -> RuleSpec<K> {
    RuleSpec {
        key,
        pattern,
        exclude: None,
    }
}

const fn rule_except<K>(key: K, pattern: &'static str, exclude: &'static str) -> RuleSpec<K> {
    RuleSpec {
        key,
        pattern,
        exclude: Some(exclude),
    }
}

#[derive(Debug)]
pub struct CompiledRule<K> {
    pub key: K,
    pattern: Regex,
    exclude: Option<Regex>,
}

impl<K> CompiledRule<K> {
    pub fn is_match(&self, lower_text: &str) -> bool {
        self.pattern.is_match(lower_text)
            && !self
                .exclude
                .as_ref()
                .is_some_and(|exclude| exclude.is_match(lower_text))
    }
}

#[derive(Debug)]
pub struct RuleTable<K> {
    rules: Vec<CompiledRule<K>>,
}

impl<K: Copy + Ord + std::fmt::Debug> RuleTable<K> {
    /// Compiles static patterns. A bad pattern is a programming error in the
    /// table itself, so it panics on first use.
    pub fn compile(specs: &[RuleSpec<K>]) -> Self {
        let rules = specs
            .iter()
            .map(|spec| CompiledRule {
                key: spec.key,
                pattern: Regex::new(spec.pattern)
                    .unwrap_or_else(|err| panic!("rule {:?}: bad pattern: {err}", spec.key)),
                exclude: spec.exclude.map(|exclude| {
                    Regex::new(exclude)
                        .unwrap_or_else(|err| panic!("rule {:?}: bad exclude: {err}", spec.key))
                }),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[CompiledRule<K>] {
        &self.rules
    }

    /// Every key with at least one matching record.
    pub fn hits(&self, lower_text: &str) -> BTreeSet<K> {
        let mut hits = BTreeSet::new();
        for rule in &self.rules {
            if hits.contains(&rule.key) {
                continue;
            }
            if rule.is_match(lower_text) {
                trace!(key = ?rule.key, "rule matched");
                hits.insert(rule.key);
            }
        }
        hits
    }

    pub fn matches(&self, key: K, lower_text: &str) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.key == key)
            .any(|rule| rule.is_match(lower_text))
    }
}

/// Semantic roles a nonland card can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Draw,
    Tutors,
    Wipes,
    MassBounce,
    Spot,
    Counters,
    Recursion,
    GyHate,
    Protection,
    Stax,
    ExtraTurns,
    ExtraCombat,
    Token,
    Blink,
    Copying,
    Ramp,
    Rocks,
    Dorks,
}

impl Role {
    pub const ALL: [Role; 18] = [
        Role::Draw,
        Role::Tutors,
        Role::Wipes,
        Role::MassBounce,
        Role::Spot,
        Role::Counters,
        Role::Recursion,
        Role::GyHate,
        Role::Protection,
        Role::Stax,
        Role::ExtraTurns,
        Role::ExtraCombat,
        Role::Token,
        Role::Blink,
        Role::Copying,
        Role::Ramp,
        Role::Rocks,
        Role::Dorks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Draw => "draw",
            Role::Tutors => "tutors",
            Role::Wipes => "wipes",
            Role::MassBounce => "mass_bounce",
            Role::Spot => "spot",
            Role::Counters => "counters",
            Role::Recursion => "recursion",
            Role::GyHate => "gy_hate",
            Role::Protection => "protection",
            Role::Stax => "stax",
            Role::ExtraTurns => "extra_turns",
            Role::ExtraCombat => "extra_combat",
            Role::Token => "token",
            Role::Blink => "blink",
            Role::Copying => "copying",
            Role::Ramp => "ramp",
            Role::Rocks => "rocks",
            Role::Dorks => "dorks",
        }
    }
}

const GRAVEYARD_TARGET: &str = r"target [^.]*?cards? (?:from|in) (?:your|a|an opponent's) graveyard";

const ROLE_RULES: &[RuleSpec<Role>] = &[
    rule(
        Role::Draw,
        r"\bdraws? (?:a|an|one|two|three|four|five|six|seven|x|\d+|that many) (?:additional )?cards?\b",
    ),
    rule(Role::Draw, r"\bdraws? cards? equal to\b"),
    rule(Role::Draw, r"\binvestigate\b"),
    rule(Role::Draw, r"\bconnives?\b"),
    rule(
        Role::Draw,
        r"exile the top [^\n]{0,40}?of your library[^\n]{0,80}?you may (?:play|cast)",
    ),
    rule(
        Role::Tutors,
        r"search your library for [^.]*?\b(?:cards?|permanent|creature|instant|sorcery|artifact|enchantment|planeswalker)\b",
    ),
    rule(
        Role::Wipes,
        r"\b(?:destroy|exile) (?:all|each) (?:other )?(?:nonland |nontoken |non-\w+ )?(?:creatures|permanents|artifacts|enchantments|planeswalkers)\b",
    ),
    rule(
        Role::Wipes,
        r"\b(?:all|each) (?:other )?creatures? [^.]*?gets? -\d+/-\d+",
    ),
    rule(
        Role::Wipes,
        r"deals? (?:\d+|x) damage to each (?:other )?creature",
    ),
    rule(
        Role::MassBounce,
        r"\breturn (?:all|each) [^.]*?(?:creatures?|nonland permanents?|permanents?)\b[^.]*? to (?:their|its) owners?'?s? hands?",
    ),
    rule_except(
        Role::Spot,
        r"\b(?:destroy|exile|return|fights?) (?:up to (?:one|two|three|x) )?(?:another )?target (?:\w+ )?(?:creature|permanent|artifact|enchantment|planeswalker|land|battle)\b",
        GRAVEYARD_TARGET,
    ),
    rule(
        Role::Spot,
        r"deals? (?:\d+|x) damage to (?:any target|target (?:creature|planeswalker|attacking|blocking))",
    ),
    rule(
        Role::Counters,
        r"\bcounter target (?:\w+ )?(?:spell|ability|activated ability|triggered ability)\b",
    ),
    rule(Role::Recursion, r"\breturn [^.]*?from your graveyard\b"),
    rule(
        Role::Recursion,
        r"\bput [^.]*?from (?:a|your) graveyard onto the battlefield",
    ),
    rule(Role::Recursion, r"\b(?:reanimate|persist|escape|unearth)\b"),
    rule_except(Role::GyHate, r"\bexile [^.]*?graveyards?\b", r"from your graveyard"),
    rule(Role::GyHate, r"\bcards? (?:from|in) graveyards\b"),
    rule(Role::Protection, r"\b(?:hexproof|indestructible|shroud)\b"),
    rule(Role::Protection, r"\bprotection from\b"),
    rule(Role::Protection, r"\bphases? out\b"),
    rule(Role::Protection, r"\bward\b"),
    rule(Role::Stax, r"\b(?:players|opponents|each opponent|your opponents) can't\b"),
    rule(
        Role::Stax,
        r"\bspells?\b[^.]*?\bcosts? \{?\d+\}? more\b",
    ),
    rule(Role::Stax, r"\bdon't untap during\b"),
    rule(Role::Stax, r"\bskips? (?:their|your|his or her) untap step\b"),
    rule(
        Role::Stax,
        r"\bcan't cast more than one spell each turn\b|\bcast only one spell each turn\b",
    ),
    rule(Role::ExtraTurns, r"\btakes? an extra turn\b"),
    rule(Role::ExtraCombat, r"\badditional combat phase\b"),
    rule(Role::Token, r"\bcreates? [^.]*?\btokens?\b"),
    rule(
        Role::Blink,
        r"\bexile [^\n]{0,80}?\breturn (?:it|that card|them|those cards|the exiled cards?|that creature)\b[^.]*? to the battlefield",
    ),
    rule(
        Role::Copying,
        r"\bcopy target (?:\w+ )?(?:spell|permanent|creature|artifact|activated|triggered|instant)",
    ),
    rule(
        Role::Copying,
        r"\bcopy (?:all|each) (?:\w+ )?(?:spells|abilities)\b",
    ),
    rule(Role::Copying, r"\bcopy (?:it|that spell|that ability)\b"),
    rule(Role::Copying, r"\btokens? that's a copy of\b"),
    rule(
        Role::Ramp,
        r"search your library for [^.]*?\b(?:land cards?|forest|island|swamp|mountain|plains)\b",
    ),
    rule(
        Role::Ramp,
        r"\bput (?:a|up to (?:one|two|three)) (?:basic )?lands? cards? [^.]*?onto the battlefield",
    ),
];

pub static ROLE_TABLE: Lazy<RuleTable<Role>> = Lazy::new(|| RuleTable::compile(ROLE_RULES));

/// Coarse stack-complexity markers recorded once per deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Marker {
    Cascade,
    Storm,
    CastTrigger,
    Replacement,
    ChooseModes,
    MultiTarget,
    Copy,
}

impl Marker {
    pub fn as_str(self) -> &'static str {
        match self {
            Marker::Cascade => "cascade",
            Marker::Storm => "storm",
            Marker::CastTrigger => "cast_trigger",
            Marker::Replacement => "replacement",
            Marker::ChooseModes => "choose_modes",
            Marker::MultiTarget => "multi_target",
            Marker::Copy => "copy",
        }
    }
}

const MARKER_RULES: &[RuleSpec<Marker>] = &[
    rule(Marker::Cascade, r"\bcascade\b"),
    rule(Marker::Storm, r"\bstorm\b"),
    rule(Marker::CastTrigger, r"\bwhen(?:ever)? you cast\b"),
    rule(Marker::Replacement, r"\bwould\b[^.]*\binstead\b"),
    rule(
        Marker::ChooseModes,
        r"\bchoose (?:one|two|three|one or more|one or both|any number)\b",
    ),
    rule(
        Marker::MultiTarget,
        r"\b(?:two|three|any number of|up to (?:two|three|four|x)) (?:other )?target\b",
    ),
    rule(Marker::Copy, r"\bcop(?:y|ies)\b"),
];

pub static MARKER_TABLE: Lazy<RuleTable<Marker>> =
    Lazy::new(|| RuleTable::compile(MARKER_RULES));

/// "Lands matter" motifs scanned over nonland text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LandMotif {
    Landfall,
    ExtraLandDrops,
    GraveyardLands,
    LandTutor,
    LandsYouControl,
    LandTokens,
}

const LAND_MOTIF_RULES: &[RuleSpec<LandMotif>] = &[
    rule(LandMotif::Landfall, r"\blandfall\b"),
    rule(
        LandMotif::Landfall,
        r"\bwhenever (?:a|one or more) lands? (?:you control )?enters?\b",
    ),
    rule(
        LandMotif::ExtraLandDrops,
        r"\bplay (?:an|two|three) additional lands?\b|\badditional land on each of your turns\b",
    ),
    rule(LandMotif::ExtraLandDrops, r"\byou may play lands? from\b"),
    rule(
        LandMotif::GraveyardLands,
        r"\b(?:return|put) [^.]*?\blands? cards? [^.]*?from your graveyard\b",
    ),
    rule(LandMotif::GraveyardLands, r"\bplay lands? from your graveyard\b"),
    rule(
        LandMotif::LandTutor,
        r"search your library for [^.]*?\blands?\b",
    ),
    rule(LandMotif::LandsYouControl, r"\blands you control\b"),
    rule(
        LandMotif::LandTokens,
        r"\bwhenever a land [^.]*?\bcreate\b|\bcreate [^.]*?tokens? [^.]*?for each land\b",
    ),
];

pub static LAND_MOTIF_TABLE: Lazy<RuleTable<LandMotif>> =
    Lazy::new(|| RuleTable::compile(LAND_MOTIF_RULES));
