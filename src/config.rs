//! Engine tunables that callers may override.
//!
//! Scoring weights stay `const` next to the code that uses them; only the
//! limits and thresholds below are meant to change per deployment.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many signal cards to publish.
    pub signal_limit: usize,
    /// How many signal lands to publish.
    pub signal_land_cap: usize,
    /// Minimum land score in ordinary decks.
    pub land_threshold_default: f64,
    /// Minimum land score once the deck cares about lands.
    pub land_threshold_land_matters: f64,
    /// Land-context score at which the lower threshold applies.
    pub land_context_elevation: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            signal_limit: 12,
            signal_land_cap: 12,
            land_threshold_default: 2.6,
            land_threshold_land_matters: 2.0,
            land_context_elevation: 3.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, FeatureError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.signal_limit == 0 {
            return Err(FeatureError::Config("signal_limit must be positive".to_string()));
        }
        if self.signal_land_cap == 0 {
            return Err(FeatureError::Config(
                "signal_land_cap must be positive".to_string(),
            ));
        }
        let thresholds = [
            ("land_threshold_default", self.land_threshold_default),
            ("land_threshold_land_matters", self.land_threshold_land_matters),
            ("land_context_elevation", self.land_context_elevation),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(FeatureError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn land_threshold(&self, land_context_score: f64) -> f64 {
        if land_context_score >= self.land_context_elevation {
            self.land_threshold_land_matters
        } else {
            self.land_threshold_default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"signal_limit": 5}"#).expect("parse");
        assert_eq!(config.signal_limit, 5);
        assert_eq!(config.signal_land_cap, 12);
        assert_eq!(config.land_threshold_default, 2.6);
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{"signal_land_cap": 0}"#).unwrap_err();
        assert!(matches!(err, FeatureError::Config(_)));
    }

    #[test]
    fn test_negative_threshold_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{"land_threshold_default": -1.0}"#).unwrap_err();
        assert!(matches!(err, FeatureError::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let err = EngineConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, FeatureError::Json(_)));
    }

    #[test]
    fn test_land_threshold_switches_at_elevation() {
        let config = EngineConfig::default();
        assert_eq!(config.land_threshold(2.99), 2.6);
        assert_eq!(config.land_threshold(3.0), 2.0);
    }
}
