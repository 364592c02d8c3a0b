//! Deck-level rollups of per-card classification: interaction split, upkeep
//! load, colorless pips, token profile, tutor breadth, and color tension.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::{CardProfile, ManaProduction};
use crate::color::{Color, ColorCounts};
use crate::mana::{colored_pips, colorless_symbols, round2};
use crate::patterns::Role;

/// Cards at or below this mana value count as "early" color demand.
const EARLY_MANA_VALUE: f64 = 3.0;

static FLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bflash\b").expect("flash pattern"));

static RECURRING_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bat the beginning of (?:your|each|each player's|each opponent's|the next)(?: next)? (?:upkeep|end step)\b",
    )
    .expect("recurring trigger pattern")
});

static MANDATORY_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bcumulative upkeep\b|\bat the beginning of your upkeep, (?:sacrifice|discard|pay|you lose)\b|\bat the beginning of your upkeep[^.]*?\b(?:sacrifice|discard) (?:a|an|this|it|~)\b",
    )
    .expect("mandatory cost pattern")
});

static TOKEN_RECURRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bat the beginning of\b|\bwhenever [^.]*?\b(?:attacks|cast|casts|enters)\b|\bwhen(?:ever)? [^.]*?\benters\b",
    )
    .expect("recurring token pattern")
});

static TUTOR_BROAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"search your library for (?:a|an|any|up to (?:one|two|three|\w+)) (?:cards?|permanent cards?)\b",
    )
    .expect("broad tutor pattern")
});

static TUTOR_NARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"search your library for [^.]*?\b(?:creature|instant|sorcery|artifact|enchantment|planeswalker|land|equipment|aura|legendary|basic|card named|cards? with|\w+ cards?)\b",
    )
    .expect("narrow tutor pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct InteractionProfile {
    pub instant: u32,
    pub mass: u32,
    pub spot: u32,
}

impl InteractionProfile {
    pub fn total(&self) -> u32 {
        self.instant
            .saturating_add(self.mass)
            .saturating_add(self.spot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpkeepLoad {
    pub recurring_triggers: u32,
    pub mandatory_costs: u32,
    pub repeatable_activations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ColorlessPips {
    pub demand: u32,
    pub supply: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TokenProfile {
    pub rate: u32,
    pub bursts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TutorBreadth {
    pub broad: u32,
    pub narrow: u32,
}

/// Cost segments of activated abilities: the text before `:` on each line
/// that contains a mana or tap symbol. Reminder parentheses are stripped.
pub fn activation_costs(lower_text: &str) -> Vec<&str> {
    lower_text
        .lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches('(');
            let (cost, _) = line.split_once(':')?;
            cost.contains('{').then_some(cost.trim())
        })
        .collect()
}

pub fn has_recurring_trigger(lower_text: &str) -> bool {
    RECURRING_TRIGGER.is_match(lower_text)
}

/// Interaction contribution of one card. Counterspells are always instant
/// speed; spot removal is instant speed on instants and flash cards.
pub fn interaction_of(profile: &CardProfile<'_>) -> InteractionProfile {
    let count = profile.card.count;
    let mut out = InteractionProfile::default();
    if profile.has(Role::Counters) {
        out.instant = out.instant.saturating_add(count);
    }
    if profile.has(Role::Spot) {
        if profile.card.has_type("instant") || FLASH.is_match(&profile.card.lower_text) {
            out.instant = out.instant.saturating_add(count);
        } else {
            out.spot = out.spot.saturating_add(count);
        }
    }
    if profile.has(Role::Wipes) || profile.has(Role::MassBounce) {
        out.mass = out.mass.saturating_add(count);
    }
    out
}

pub fn upkeep_of(lower_text: &str, count: u32) -> UpkeepLoad {
    let mut out = UpkeepLoad::default();
    if has_recurring_trigger(lower_text) {
        out.recurring_triggers = count;
    }
    if MANDATORY_COST.is_match(lower_text) {
        out.mandatory_costs = count;
    }
    let distinct: BTreeSet<&str> = activation_costs(lower_text).into_iter().collect();
    match distinct.len() {
        0 => {}
        1 => out.repeatable_activations = count,
        _ => out.repeatable_activations = count.saturating_mul(2),
    }
    out
}

/// Explicit `{C}` in the mana cost plus `{C}` inside activation costs.
pub fn colorless_demand(mana_cost: &str, lower_text: &str) -> u32 {
    let in_costs: usize = activation_costs(lower_text)
        .iter()
        .map(|cost| cost.matches("{c}").count())
        .sum();
    colorless_symbols(mana_cost).saturating_add(u32::try_from(in_costs).unwrap_or(u32::MAX))
}

pub fn tutor_breadth_of(lower_text: &str, count: u32) -> TutorBreadth {
    if TUTOR_BROAD.is_match(lower_text) {
        TutorBreadth {
            broad: count,
            narrow: 0,
        }
    } else if TUTOR_NARROW.is_match(lower_text) {
        TutorBreadth {
            broad: 0,
            narrow: count,
        }
    } else {
        TutorBreadth::default()
    }
}

/// Running totals across every nonland card in a deck.
#[derive(Debug, Clone, Default)]
pub struct DeckAggregate {
    pub interaction: InteractionProfile,
    pub upkeep_load: UpkeepLoad,
    pub c_pips: ColorlessPips,
    pub token_profile: TokenProfile,
    pub tutor_breadth: TutorBreadth,
    pub coloured_mana_curve: ColorCounts,
    pub early_pips: ColorCounts,
    pub nonland_sources: ColorCounts,
    pub nonland_count: u32,
    /// Every `spot` role hit, whichever interaction bucket it was routed to.
    pub spot_hits: u32,
}

impl DeckAggregate {
    pub fn observe(&mut self, profile: &CardProfile<'_>) {
        let card = profile.card;
        let count = card.count;
        let text = card.lower_text.as_str();
        self.nonland_count = self.nonland_count.saturating_add(count);

        let interaction = interaction_of(profile);
        self.interaction.instant = self.interaction.instant.saturating_add(interaction.instant);
        self.interaction.mass = self.interaction.mass.saturating_add(interaction.mass);
        self.interaction.spot = self.interaction.spot.saturating_add(interaction.spot);
        if profile.has(Role::Spot) {
            self.spot_hits = self.spot_hits.saturating_add(count);
        }

        let upkeep = upkeep_of(text, count);
        let load = &mut self.upkeep_load;
        load.recurring_triggers = load.recurring_triggers.saturating_add(upkeep.recurring_triggers);
        load.mandatory_costs = load.mandatory_costs.saturating_add(upkeep.mandatory_costs);
        load.repeatable_activations = load
            .repeatable_activations
            .saturating_add(upkeep.repeatable_activations);

        let demand = colorless_demand(&card.mana_cost, text).saturating_mul(count);
        self.c_pips.demand = self.c_pips.demand.saturating_add(demand);
        if profile.is_nonland_source() && profile.production.colorless > 0 {
            self.c_pips.supply = self.c_pips.supply.saturating_add(count);
        }

        if profile.has(Role::Token) {
            if TOKEN_RECURRING.is_match(text) {
                self.token_profile.rate = self.token_profile.rate.saturating_add(count);
            } else {
                self.token_profile.bursts = self.token_profile.bursts.saturating_add(count);
            }
        }

        let tutors = tutor_breadth_of(text, count);
        self.tutor_breadth.broad = self.tutor_breadth.broad.saturating_add(tutors.broad);
        self.tutor_breadth.narrow = self.tutor_breadth.narrow.saturating_add(tutors.narrow);

        let pips = colored_pips(&card.mana_cost);
        self.coloured_mana_curve.add_scaled(&pips, count as f64);
        if card.mana_value <= EARLY_MANA_VALUE {
            self.early_pips.add_scaled(&pips, count as f64);
        }

        if profile.is_nonland_source() {
            self.nonland_sources
                .add_scaled(&profile.production.colors, count as f64);
        }
    }

    /// Lands that tap for `{C}` add to colorless supply.
    pub fn observe_land(&mut self, production: &ManaProduction, count: u32) {
        if production.colorless > 0 {
            self.c_pips.supply = self.c_pips.supply.saturating_add(count);
        }
    }

    /// Interaction over nonland count. The numerator counts additively: an
    /// instant-speed spot card counts once as `instant` and once as a spot
    /// hit, so instant removal weighs double.
    pub fn interaction_density(&self) -> f64 {
        if self.nonland_count == 0 {
            return 0.0;
        }
        let numerator = self
            .interaction
            .instant
            .saturating_add(self.interaction.mass)
            .saturating_add(self.spot_hits);
        round2(numerator as f64 / self.nonland_count as f64)
    }

    /// Early colored demand over colored sources, per color.
    pub fn color_tension(&self, land_sources: &ColorCounts) -> ColorCounts {
        let mut tension = ColorCounts::default();
        for color in Color::ALL {
            let sources = land_sources.get(color) + self.nonland_sources.get(color);
            tension.set(color, round2(self.early_pips.get(color) / sources.max(1.0)));
        }
        tension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardLite, CardStack};
    use crate::classify::classify_card;
    use crate::color::ColorSet;

    fn stack(count: u32, type_line: &str, mana_cost: &str, mv: f64, text: &str) -> CardStack {
        CardStack::from_card(
            &CardLite {
                name: Some("Test".to_string()),
                mana_value: Some(mv),
                mana_cost: Some(mana_cost.to_string()),
                type_line: Some(type_line.to_string()),
                text: Some(text.to_string()),
                ..CardLite::default()
            },
            count,
        )
    }

    #[test]
    fn test_spot_removal_speed_routing() {
        let sorcery = stack(1, "Sorcery", "{1}{B}", 2.0, "Destroy target creature.");
        let flash = stack(1, "Creature — Human", "{2}{W}", 3.0, "Flash\nWhen this creature enters, exile target creature.");
        let instant = stack(2, "Instant", "{W}", 1.0, "Exile target creature.");

        let of = |card: &CardStack| interaction_of(&classify_card(card, ColorSet::COLORLESS));
        assert_eq!(of(&sorcery), InteractionProfile { instant: 0, mass: 0, spot: 1 });
        assert_eq!(of(&flash), InteractionProfile { instant: 1, mass: 0, spot: 0 });
        assert_eq!(of(&instant), InteractionProfile { instant: 2, mass: 0, spot: 0 });
    }

    #[test]
    fn test_counterspell_and_wipe_buckets() {
        let counter = stack(1, "Instant", "{U}{U}", 2.0, "Counter target spell.");
        let wipe = stack(1, "Sorcery", "{2}{W}{W}", 4.0, "Destroy all creatures.");
        let of = |card: &CardStack| interaction_of(&classify_card(card, ColorSet::COLORLESS));
        assert_eq!(of(&counter).instant, 1);
        assert_eq!(of(&wipe).mass, 1);
    }

    #[test]
    fn test_upkeep_load() {
        let text = "cumulative upkeep {1}\nat the beginning of your upkeep, put a counter on this.";
        let load = upkeep_of(text, 1);
        assert_eq!(load.recurring_triggers, 1);
        assert_eq!(load.mandatory_costs, 1);
        assert_eq!(load.repeatable_activations, 0);
    }

    #[test]
    fn test_repeatable_activations_double_with_two_costs() {
        let one = upkeep_of("{t}: add {g}.", 3);
        assert_eq!(one.repeatable_activations, 3);
        let two = upkeep_of("{1}, {t}: draw a card.\n{2}{u}: untap this artifact.", 3);
        assert_eq!(two.repeatable_activations, 6);
        let none = upkeep_of("flying", 3);
        assert_eq!(none.repeatable_activations, 0);
    }

    #[test]
    fn test_colorless_demand_counts_costs_not_production() {
        assert_eq!(colorless_demand("{2}{W/U}", ""), 0);
        assert_eq!(colorless_demand("{3}{C}", "{c}, {t}: draw a card.\n{t}: add {c}."), 2);
    }

    #[test]
    fn test_tutor_breadth_broad_takes_precedence() {
        assert_eq!(
            tutor_breadth_of("search your library for a card, put that card into your hand.", 1),
            TutorBreadth { broad: 1, narrow: 0 }
        );
        assert_eq!(
            tutor_breadth_of("search your library for a creature card with mana value 3.", 1),
            TutorBreadth { broad: 0, narrow: 1 }
        );
        assert_eq!(
            tutor_breadth_of("search your library for up to two basic land cards", 1),
            TutorBreadth { broad: 0, narrow: 1 }
        );
    }

    #[test]
    fn test_token_rate_and_bursts() {
        let mut aggregate = DeckAggregate::default();
        let engine = stack(1, "Enchantment", "{2}{W}", 3.0, "At the beginning of your upkeep, create a 1/1 white Soldier creature token.");
        let burst = stack(2, "Sorcery", "{3}{W}", 4.0, "Create three 1/1 white Spirit creature tokens with flying.");
        aggregate.observe(&classify_card(&engine, ColorSet::COLORLESS));
        aggregate.observe(&classify_card(&burst, ColorSet::COLORLESS));
        assert_eq!(aggregate.token_profile, TokenProfile { rate: 1, bursts: 2 });
    }

    #[test]
    fn test_color_tension_divides_by_sources() {
        let mut aggregate = DeckAggregate::default();
        let early = stack(4, "Instant", "{W}{W}", 2.0, "");
        let late = stack(1, "Sorcery", "{5}{W}{W}", 7.0, "");
        aggregate.observe(&classify_card(&early, ColorSet::COLORLESS));
        aggregate.observe(&classify_card(&late, ColorSet::COLORLESS));

        let mut lands = ColorCounts::default();
        lands.add(Color::White, 16.0);
        let tension = aggregate.color_tension(&lands);
        assert_eq!(tension.white, 0.5);
        assert_eq!(tension.blue, 0.0);
        assert_eq!(aggregate.coloured_mana_curve.white, 10.0);
    }

    #[test]
    fn test_color_tension_without_sources_uses_one() {
        let mut aggregate = DeckAggregate::default();
        let card = stack(3, "Creature — Goblin", "{R}", 1.0, "");
        aggregate.observe(&classify_card(&card, ColorSet::COLORLESS));
        let tension = aggregate.color_tension(&ColorCounts::default());
        assert_eq!(tension.red, 3.0);
    }

    #[test]
    fn test_density_counts_instant_spot_twice() {
        let mut aggregate = DeckAggregate::default();
        let swords = stack(1, "Instant", "{W}", 1.0, "Exile target creature.");
        let ramp = stack(1, "Sorcery", "{2}{G}", 3.0, "Search your library for a basic land card.");
        aggregate.observe(&classify_card(&swords, ColorSet::COLORLESS));
        aggregate.observe(&classify_card(&ramp, ColorSet::COLORLESS));
        assert_eq!(aggregate.interaction, InteractionProfile { instant: 1, mass: 0, spot: 0 });
        assert_eq!(aggregate.interaction_density(), 1.0);
    }

    #[test]
    fn test_density_sorcery_spot_counts_once() {
        let mut aggregate = DeckAggregate::default();
        let removal = stack(2, "Sorcery", "{1}{B}", 2.0, "Destroy target creature.");
        aggregate.observe(&classify_card(&removal, ColorSet::COLORLESS));
        assert_eq!(aggregate.interaction.spot, 2);
        assert_eq!(aggregate.interaction_density(), 1.0);
    }

    #[test]
    fn test_huge_stacks_saturate() {
        let mut aggregate = DeckAggregate::default();
        let engine = stack(
            u32::MAX,
            "Artifact",
            "{C}{C}",
            2.0,
            "{1}, {T}: Draw a card.\n{2}, {T}: Scry 1.\nCounter target spell. Exile target creature.",
        );
        aggregate.observe(&classify_card(&engine, ColorSet::COLORLESS));
        aggregate.observe(&classify_card(&engine, ColorSet::COLORLESS));
        assert_eq!(aggregate.nonland_count, u32::MAX);
        assert_eq!(aggregate.interaction.instant, u32::MAX);
        assert_eq!(aggregate.upkeep_load.repeatable_activations, u32::MAX);
        assert_eq!(aggregate.c_pips.demand, u32::MAX);
    }
}
