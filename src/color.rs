use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mana::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    /// Parses a single mana letter (`W`, `U`, `B`, `R`, `G`), case-insensitive.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            _ => None,
        }
    }

    /// Parses a color identity entry, accepting either the mana letter or the
    /// full color name.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "white" => return Some(Color::White),
            "blue" => return Some(Color::Blue),
            "black" => return Some(Color::Black),
            "red" => return Some(Color::Red),
            "green" => return Some(Color::Green),
            _ => {}
        }
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Self::from_symbol(ch),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }
}

/// A set of colors represented as bitflags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorSet(u8);

impl ColorSet {
    pub const COLORLESS: Self = Self(0);
    pub const WHITE: Self = Self(1 << 0);
    pub const BLUE: Self = Self(1 << 1);
    pub const BLACK: Self = Self(1 << 2);
    pub const RED: Self = Self(1 << 3);
    pub const GREEN: Self = Self(1 << 4);
    pub const ALL: Self = Self(0b1_1111);

    pub const fn from_color(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE,
            Color::Blue => Self::BLUE,
            Color::Black => Self::BLACK,
            Color::Red => Self::RED,
            Color::Green => Self::GREEN,
        }
    }

    /// Builds a set from commander color identity strings, ignoring anything
    /// that does not name a color.
    pub fn from_identity<S: AsRef<str>>(identity: &[S]) -> Self {
        identity
            .iter()
            .filter_map(|entry| Color::parse(entry.as_ref()))
            .collect()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, color: Color) -> bool {
        self.0 & Self::from_color(color).0 != 0
    }

    pub const fn with(self, color: Color) -> Self {
        Self(self.0 | Self::from_color(color).0)
    }

    /// Colors a "mana of any color" source can produce: the identity itself,
    /// or all five colors when there is no identity to restrict it.
    pub const fn or_all(self) -> Self {
        if self.is_empty() { Self::ALL } else { self }
    }

    pub fn iter(self) -> impl Iterator<Item = Color> {
        Color::ALL.into_iter().filter(move |color| self.contains(*color))
    }

    pub fn symbols(self) -> Vec<String> {
        self.iter().map(|color| color.symbol().to_string()).collect()
    }
}

impl FromIterator<Color> for ColorSet {
    fn from_iter<T: IntoIterator<Item = Color>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ColorSet::COLORLESS, |set, color| set.with(color))
    }
}

/// Non-negative per-color tallies, serialized as `{ "W": .., "U": .., ... }`.
///
/// Hybrid symbols contribute fractional amounts, so the slots are `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ColorCounts {
    #[serde(rename = "W")]
    pub white: f64,
    #[serde(rename = "U")]
    pub blue: f64,
    #[serde(rename = "B")]
    pub black: f64,
    #[serde(rename = "R")]
    pub red: f64,
    #[serde(rename = "G")]
    pub green: f64,
}

impl ColorCounts {
    pub fn get(&self, color: Color) -> f64 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
        }
    }

    fn slot_mut(&mut self, color: Color) -> &mut f64 {
        match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
        }
    }

    /// Adds to one color. Negative amounts are ignored so tallies never drop
    /// below zero.
    pub fn add(&mut self, color: Color, amount: f64) {
        if amount > 0.0 && amount.is_finite() {
            *self.slot_mut(color) += amount;
        }
    }

    pub fn set(&mut self, color: Color, amount: f64) {
        *self.slot_mut(color) = amount.max(0.0);
    }

    /// Adds every slot of `other` scaled by `factor`.
    pub fn add_scaled(&mut self, other: &ColorCounts, factor: f64) {
        for color in Color::ALL {
            self.add(color, other.get(color) * factor);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Color, f64)> + '_ {
        Color::ALL.into_iter().map(|color| (color, self.get(color)))
    }

    pub fn total(&self) -> f64 {
        self.iter().map(|(_, amount)| amount).sum()
    }

    pub fn rounded(&self) -> Self {
        let mut out = Self::default();
        for (color, amount) in self.iter() {
            out.set(color, round2(amount));
        }
        out
    }

    /// Returns the first color whose slot is negative or not finite.
    pub fn first_invalid(&self) -> Option<Color> {
        self.iter()
            .find(|(_, amount)| !amount.is_finite() || *amount < 0.0)
            .map(|(color, _)| color)
    }
}
