//! Similarity strategy trait and the probe it scores
//!
//! Provides the [`SimilarityStrategy`] trait for pluggable text scoring. The
//! index adds boosts and decay on top; a strategy only answers "how alike are
//! these texts".

use std::collections::BTreeSet;

use triage_model::{normalize_component, text, FeedbackItem};

use crate::snapshot::{CorpusSnapshot, IndexedIssue};

/// Text scorer between a candidate item and one indexed issue
///
/// # Contract
/// - `score` is deterministic and returns a value in `[0, 1]`
/// - disjoint token sets score 0.0
/// - set-based strategies never lower the score when a shared token is added
pub trait SimilarityStrategy: Send + Sync + std::fmt::Debug {
    /// Score a probe against an issue, with corpus statistics available
    fn score(&self, probe: &Probe, issue: &IndexedIssue, snapshot: &CorpusSnapshot) -> f64;

    /// Strategy name (for configuration and rationale)
    fn name(&self) -> &'static str;
}

/// Tokenized view of a candidate item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Content tokens of the item text, in order
    pub tokens: Vec<String>,
    /// Distinct content tokens
    pub token_set: BTreeSet<String>,
    /// Distinct title tokens
    pub title_set: BTreeSet<String>,
    /// Detected component
    pub component: Option<String>,
    /// Kind label (`bug`, `feature`, `enhancement`)
    pub kind_label: String,
}

impl Probe {
    /// Tokenize an item's description
    #[must_use]
    pub fn from_item(item: &FeedbackItem) -> Self {
        let source = if item.description.trim().is_empty() {
            &item.title
        } else {
            &item.description
        };
        let tokens = text::content_tokens(source);
        Self {
            token_set: tokens.iter().cloned().collect(),
            title_set: text::token_set(&item.title),
            tokens,
            component: item.component.as_deref().and_then(normalize_component),
            kind_label: item.kind.label().to_string(),
        }
    }

    /// Probe from plain text (no component or kind context)
    #[must_use]
    pub fn from_text(input: &str) -> Self {
        let tokens = text::content_tokens(input);
        let token_set: BTreeSet<String> = tokens.iter().cloned().collect();
        Self {
            title_set: token_set.clone(),
            token_set,
            tokens,
            component: text::primary_component(input).map(str::to_string),
            kind_label: String::new(),
        }
    }
}
