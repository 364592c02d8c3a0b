//! Mana-cost symbols, colored pip counting, curve buckets, and effective mana
//! value.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorCounts};

/// One `{...}` group of a printed mana cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManaSymbol {
    /// A single colored pip, e.g. {W}
    Colored(Color),
    /// Two-color hybrid, e.g. {W/U}
    Hybrid(Color, Color),
    /// Phyrexian pip, e.g. {W/P}
    Phyrexian(Color),
    /// Two generic or one colored, e.g. {2/W}
    TwoOrColor(Color),
    /// Colorless-specific mana {C}
    Colorless,
    /// Generic mana {1}, {2}, etc.
    Generic(u32),
    /// Variable mana {X}
    X,
    /// Snow mana {S}
    Snow,
    /// Anything we don't recognize. Contributes nothing.
    Unknown,
}

impl ManaSymbol {
    /// Parses the inside of one brace group (without the braces).
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        let parts: Vec<&str> = upper.split('/').map(str::trim).collect();
        let single_color = |part: &str| {
            let mut chars = part.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Color::from_symbol(ch),
                _ => None,
            }
        };

        match parts.as_slice() {
            [one] => {
                if !one.is_empty() && one.chars().all(|c| c.is_ascii_digit()) {
                    return one
                        .parse::<u32>()
                        .map(ManaSymbol::Generic)
                        .unwrap_or(ManaSymbol::Unknown);
                }
                match *one {
                    "C" => ManaSymbol::Colorless,
                    "X" | "Y" | "Z" => ManaSymbol::X,
                    "S" => ManaSymbol::Snow,
                    other => single_color(other)
                        .map(ManaSymbol::Colored)
                        .unwrap_or(ManaSymbol::Unknown),
                }
            }
            [left, "P"] => single_color(*left)
                .map(ManaSymbol::Phyrexian)
                .unwrap_or(ManaSymbol::Unknown),
            ["2", right] => single_color(*right)
                .map(ManaSymbol::TwoOrColor)
                .unwrap_or(ManaSymbol::Unknown),
            // Phyrexian hybrid ({G/U/P}) is counted like plain hybrid.
            [left, right] | [left, right, "P"] => match (single_color(*left), single_color(*right)) {
                (Some(a), Some(b)) => ManaSymbol::Hybrid(a, b),
                _ => ManaSymbol::Unknown,
            },
            _ => ManaSymbol::Unknown,
        }
    }

    /// Adds this symbol's colored pip weight to `counts`, `times` over.
    pub fn add_pips(self, counts: &mut ColorCounts, times: f64) {
        match self {
            ManaSymbol::Colored(color)
            | ManaSymbol::Phyrexian(color)
            | ManaSymbol::TwoOrColor(color) => counts.add(color, times),
            ManaSymbol::Hybrid(a, b) => {
                counts.add(a, 0.5 * times);
                counts.add(b, 0.5 * times);
            }
            ManaSymbol::Colorless
            | ManaSymbol::Generic(_)
            | ManaSymbol::X
            | ManaSymbol::Snow
            | ManaSymbol::Unknown => {}
        }
    }
}

/// Splits a printed cost like `{2}{W/U}` into symbols. Text outside braces and
/// unterminated groups are dropped.
pub fn parse_mana_cost(raw: &str) -> Vec<ManaSymbol> {
    let mut symbols = Vec::new();
    let mut current = String::new();
    let mut in_brace = false;

    for ch in raw.chars() {
        match ch {
            '{' => {
                in_brace = true;
                current.clear();
            }
            '}' if in_brace => {
                symbols.push(ManaSymbol::parse(&current));
                in_brace = false;
            }
            _ if in_brace => current.push(ch),
            _ => {}
        }
    }

    symbols
}

/// Colored pip counts for one copy of a card.
pub fn colored_pips(mana_cost: &str) -> ColorCounts {
    let mut counts = ColorCounts::default();
    for symbol in parse_mana_cost(mana_cost) {
        symbol.add_pips(&mut counts, 1.0);
    }
    counts
}

/// Number of `{C}` symbols in a printed cost.
pub fn colorless_symbols(mana_cost: &str) -> u32 {
    parse_mana_cost(mana_cost)
        .into_iter()
        .filter(|symbol| matches!(symbol, ManaSymbol::Colorless))
        .count() as u32
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ordinal mana curve buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurveBucket {
    ZeroOne,
    Two,
    Three,
    Four,
    Five,
    SixPlus,
}

impl CurveBucket {
    pub const ALL: [CurveBucket; 6] = [
        CurveBucket::ZeroOne,
        CurveBucket::Two,
        CurveBucket::Three,
        CurveBucket::Four,
        CurveBucket::Five,
        CurveBucket::SixPlus,
    ];

    /// Fractional values between buckets round down, but never below "2"
    /// once they exceed 1.
    pub fn for_mana_value(mana_value: f64) -> Self {
        if mana_value.is_nan() || mana_value <= 1.0 {
            return CurveBucket::ZeroOne;
        }
        match mana_value.floor() as u32 {
            0..=2 => CurveBucket::Two,
            3 => CurveBucket::Three,
            4 => CurveBucket::Four,
            5 => CurveBucket::Five,
            _ => CurveBucket::SixPlus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CurveBucket::ZeroOne => "0-1",
            CurveBucket::Two => "2",
            CurveBucket::Three => "3",
            CurveBucket::Four => "4",
            CurveBucket::Five => "5",
            CurveBucket::SixPlus => "6+",
        }
    }
}

/// Card counts per curve bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CurveBuckets {
    #[serde(rename = "0-1")]
    pub zero_one: u32,
    #[serde(rename = "2")]
    pub two: u32,
    #[serde(rename = "3")]
    pub three: u32,
    #[serde(rename = "4")]
    pub four: u32,
    #[serde(rename = "5")]
    pub five: u32,
    #[serde(rename = "6+")]
    pub six_plus: u32,
}

impl CurveBuckets {
    pub fn get(&self, bucket: CurveBucket) -> u32 {
        match bucket {
            CurveBucket::ZeroOne => self.zero_one,
            CurveBucket::Two => self.two,
            CurveBucket::Three => self.three,
            CurveBucket::Four => self.four,
            CurveBucket::Five => self.five,
            CurveBucket::SixPlus => self.six_plus,
        }
    }

    pub fn add(&mut self, mana_value: f64, count: u32) {
        let slot = match CurveBucket::for_mana_value(mana_value) {
            CurveBucket::ZeroOne => &mut self.zero_one,
            CurveBucket::Two => &mut self.two,
            CurveBucket::Three => &mut self.three,
            CurveBucket::Four => &mut self.four,
            CurveBucket::Five => &mut self.five,
            CurveBucket::SixPlus => &mut self.six_plus,
        };
        *slot = slot.saturating_add(count);
    }

    pub fn total(&self) -> u32 {
        CurveBucket::ALL
            .iter()
            .fold(0u32, |total, bucket| total.saturating_add(self.get(*bucket)))
    }
}

// Alternative-cost discounts, in mana. These are rough "typical board"
// estimates, not what the mechanic pays in any particular game.

/// A commander graveyard usually covers about two generic.
const DELVE_DISCOUNT: f64 = 2.0;
/// Artifact decks playing affinity usually have two or more artifacts out.
const AFFINITY_DISCOUNT: f64 = 2.0;
/// Sacrificing a small creature refunds roughly two mana of the emerge cost.
const EMERGE_DISCOUNT: f64 = 2.0;
/// Tapping creatures is less reliable than tapping artifacts or graveyard size.
const CONVOKE_DISCOUNT: f64 = 1.5;
const IMPROVISE_DISCOUNT: f64 = 1.5;

static ALTERNATIVE_COSTS: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    [
        (r"\bdelve\b", DELVE_DISCOUNT),
        (r"\baffinity for\b", AFFINITY_DISCOUNT),
        (r"\bemerge\b", EMERGE_DISCOUNT),
        (r"\bconvoke\b", CONVOKE_DISCOUNT),
        (r"\bimprovise\b", IMPROVISE_DISCOUNT),
    ]
    .into_iter()
    .map(|(pattern, discount)| {
        (
            Regex::new(pattern).expect("alternative cost pattern is valid"),
            discount,
        )
    })
    .collect()
});

static COSTS_LESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"costs? \{?(\d+)\}? less to cast").expect("cost reduction pattern is valid")
});

/// Mana value after known alternative-cost discounts, floored at zero and
/// rounded to two decimals. Discounts stack additively.
pub fn effective_mana_value(mana_value: f64, lower_text: &str) -> f64 {
    let mut effective = mana_value.max(0.0);
    for (pattern, discount) in ALTERNATIVE_COSTS.iter() {
        if pattern.is_match(lower_text) {
            effective -= discount;
        }
    }

    if let Some(n) = COSTS_LESS
        .captures(lower_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    {
        // A reduction never takes the spell below one mana on its own.
        effective -= n.min((effective - 1.0).max(0.0));
    }

    round2(effective.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mana_cost_symbol_kinds() {
        let symbols = parse_mana_cost("{2}{W/U}{2/B}{R/P}{C}{X}{G}{S}{Q}");
        assert_eq!(
            symbols,
            vec![
                ManaSymbol::Generic(2),
                ManaSymbol::Hybrid(Color::White, Color::Blue),
                ManaSymbol::TwoOrColor(Color::Black),
                ManaSymbol::Phyrexian(Color::Red),
                ManaSymbol::Colorless,
                ManaSymbol::X,
                ManaSymbol::Colored(Color::Green),
                ManaSymbol::Snow,
                ManaSymbol::Unknown,
            ]
        );
    }

    #[test]
    fn test_parse_mana_cost_ignores_unterminated_group() {
        assert_eq!(
            parse_mana_cost("{1}{G"),
            vec![ManaSymbol::Generic(1)]
        );
        assert!(parse_mana_cost("").is_empty());
    }

    #[test]
    fn test_hybrid_pips_split_evenly() {
        let pips = colored_pips("{2}{W/U}");
        assert_eq!(pips.white, 0.5);
        assert_eq!(pips.blue, 0.5);
        assert_eq!(pips.total(), 1.0);
        assert_eq!(colorless_symbols("{2}{W/U}"), 0);
    }

    #[test]
    fn test_phyrexian_and_twobrid_count_one_pip() {
        let pips = colored_pips("{1}{W/P}{W/P}{2/G}");
        assert_eq!(pips.white, 2.0);
        assert_eq!(pips.green, 1.0);
    }

    #[test]
    fn test_phyrexian_hybrid_counts_as_hybrid() {
        let pips = colored_pips("{G/U/P}");
        assert_eq!(pips.green, 0.5);
        assert_eq!(pips.blue, 0.5);
    }

    #[test]
    fn test_colorless_symbols_are_tracked_separately() {
        assert_eq!(colorless_symbols("{3}{C}{C}"), 2);
        assert_eq!(colored_pips("{3}{C}{C}").total(), 0.0);
    }

    #[test]
    fn test_curve_bucket_boundaries() {
        assert_eq!(CurveBucket::for_mana_value(0.0), CurveBucket::ZeroOne);
        assert_eq!(CurveBucket::for_mana_value(1.0), CurveBucket::ZeroOne);
        assert_eq!(CurveBucket::for_mana_value(1.5), CurveBucket::Two);
        assert_eq!(CurveBucket::for_mana_value(3.0), CurveBucket::Three);
        assert_eq!(CurveBucket::for_mana_value(5.5), CurveBucket::Five);
        assert_eq!(CurveBucket::for_mana_value(6.0), CurveBucket::SixPlus);
        assert_eq!(CurveBucket::for_mana_value(15.0), CurveBucket::SixPlus);
        assert_eq!(CurveBucket::for_mana_value(f64::NAN), CurveBucket::ZeroOne);
    }

    #[test]
    fn test_curve_buckets_serialize_with_labels() {
        let mut curve = CurveBuckets::default();
        curve.add(3.0, 2);
        curve.add(7.0, 1);
        let json = serde_json::to_value(curve).expect("serialize");
        assert_eq!(json["3"], 2);
        assert_eq!(json["6+"], 1);
        assert_eq!(curve.total(), 3);
    }

    #[test]
    fn test_effective_mana_value_floors_at_zero() {
        assert_eq!(effective_mana_value(1.0, "delve"), 0.0);
        assert_eq!(effective_mana_value(8.0, "delve (each card you exile...)"), 6.0);
    }

    #[test]
    fn test_effective_mana_value_discounts_stack() {
        assert_eq!(effective_mana_value(7.0, "convoke\nimprovise"), 4.0);
        assert_eq!(effective_mana_value(5.0, "affinity for artifacts"), 3.0);
    }

    #[test]
    fn test_effective_mana_value_costs_less_keeps_one_mana() {
        let text = "this spell costs {3} less to cast if you control a wizard.";
        assert_eq!(effective_mana_value(5.0, text), 2.0);
        assert_eq!(effective_mana_value(3.0, text), 1.0);
        assert_eq!(effective_mana_value(1.0, text), 1.0);
    }
}
