//! Parser errors and non-fatal warnings

use serde::{Deserialize, Serialize};
use triage_model::{FeedbackItem, ItemId, UnknownVariant};

/// Errors that reject feedback before any item exists
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Empty or unparseable feedback
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Structured input is not valid JSON of the expected shape
    #[error("malformed structured feedback: {0}")]
    Structured(#[from] serde_json::Error),

    /// Structured entry carries an unknown kind or severity
    #[error("entry {index}: {source}")]
    UnknownValue {
        index: usize,
        #[source]
        source: UnknownVariant,
    },
}

impl ParseError {
    /// Create invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}

/// Conditions that let an item proceed but must be surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ParseWarning {
    /// No classification rule matched; default kind used and info requested
    AmbiguousClassification {
        /// Affected item
        item: ItemId,
    },

    /// Split depth limit reached while the item was still divisible
    SplitDepthExceeded {
        /// Item kept unsplit
        item: ItemId,
        /// Depth at which splitting stopped
        depth: u32,
    },
}

impl ParseWarning {
    /// Ambiguity warning for an item classified without any signal
    #[must_use]
    pub fn for_item(item: &FeedbackItem) -> Option<Self> {
        (item.classification_confidence <= 0.0).then(|| Self::AmbiguousClassification {
            item: item.id.clone(),
        })
    }

    /// Item the warning refers to
    #[must_use]
    pub fn item(&self) -> &ItemId {
        match self {
            Self::AmbiguousClassification { item } | Self::SplitDepthExceeded { item, .. } => item,
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AmbiguousClassification { item } => {
                write!(f, "item {item}: ambiguous classification, more info needed")
            }
            Self::SplitDepthExceeded { item, depth } => {
                write!(f, "item {item}: split depth {depth} reached, kept oversized")
            }
        }
    }
}
