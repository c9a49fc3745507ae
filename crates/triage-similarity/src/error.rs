//! Similarity errors

/// Errors from strategy resolution and index construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimilarityError {
    /// No strategy registered under this name
    #[error("unknown similarity strategy: '{name}' (available: {available})")]
    UnknownStrategy { name: String, available: String },

    /// Parameter outside its valid range
    #[error("invalid similarity parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl SimilarityError {
    /// Create invalid parameter error
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
