//! decksignal - deck feature and signal extraction.
//!
//! Turns a raw commander decklist into a versioned feature vector (curve,
//! roles, interaction, upkeep, tokens, tutors, color tension, signal cards)
//! and a curated list of signal lands. Everything here is a pure function of
//! the deck snapshot; no I/O happens outside the tooling binary.

pub mod aggregate;
pub mod card;
pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod features;
pub mod lands;
pub mod mana;
pub mod patterns;
pub mod signals;

pub use aggregate::{ColorlessPips, InteractionProfile, TokenProfile, TutorBreadth, UpkeepLoad};
pub use card::{CardLite, DeckEntry, DeckLite, NormalizedDeck, normalize};
pub use color::{Color, ColorCounts, ColorSet};
pub use config::EngineConfig;
pub use error::FeatureError;
pub use features::{
    DeckFeatureVector, FEATURE_SCHEMA_VERSION, build_features, build_features_with,
    feature_vector_schema,
};
pub use lands::{LandCompression, LandTag, SignalLand, compress_lands, compress_lands_with};
pub use mana::{CurveBucket, CurveBuckets, ManaSymbol};
pub use signals::{SignalCard, SignalTag};
