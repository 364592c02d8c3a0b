use thiserror::Error;

/// Errors surfaced by the feature engine.
///
/// Malformed card data never produces an error; it coalesces to empty values
/// during normalization.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The assembled vector broke one of its own invariants. Re-running on
    /// the same deck would fail identically.
    #[error("feature vector failed schema validation at `{field}`: {reason}")]
    Schema { field: String, reason: String },

    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeatureError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FeatureError::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
