//! Weighted Jaccard strategy
//!
//! Token-set overlap, weighted towards the issue title:
//! `title_weight × J(probe, title) + (1 − title_weight) × J(probe, title ∪ body)`.

use triage_model::text;

use crate::snapshot::{CorpusSnapshot, IndexedIssue};
use crate::strategy::{Probe, SimilarityStrategy};

/// Weighted Jaccard similarity over content tokens
#[derive(Debug, Clone, Copy)]
pub struct WeightedJaccard {
    title_weight: f64,
}

impl Default for WeightedJaccard {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightedJaccard {
    /// Strategy name
    pub const NAME: &'static str = "weighted-jaccard";

    /// Default weights: 0.7 title, 0.3 title and body
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { title_weight: 0.7 }
    }

    /// With title weight, clamped to `[0, 1]`
    #[inline]
    #[must_use]
    pub fn with_title_weight(mut self, weight: f64) -> Self {
        self.title_weight = weight.clamp(0.0, 1.0);
        self
    }
}

impl SimilarityStrategy for WeightedJaccard {
    fn score(&self, probe: &Probe, issue: &IndexedIssue, _snapshot: &CorpusSnapshot) -> f64 {
        let title = text::jaccard(&probe.token_set, &issue.title_set);
        let full = text::jaccard(&probe.token_set, &issue.full_set);
        (self.title_weight * title + (1.0 - self.title_weight) * full).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use triage_model::IssueRecord;

    #[test]
    fn identical_and_disjoint() {
        let snapshot = CorpusSnapshot::empty(Utc::now());
        let issue = IndexedIssue::new(IssueRecord::open(1, "Export fails for large files"));
        let strategy = WeightedJaccard::new();

        let same = strategy.score(&Probe::from_text("Export fails for large files"), &issue, &snapshot);
        let other = strategy.score(&Probe::from_text("Dark mode please"), &issue, &snapshot);
        assert!((same - 1.0).abs() < 1e-9);
        assert_eq!(other, 0.0);
    }

    #[test]
    fn body_contributes_partially() {
        let snapshot = CorpusSnapshot::empty(Utc::now());
        let issue = IndexedIssue::new(
            IssueRecord::open(456, "Checkout submit button unresponsive")
                .with_body("Clicking submit on the checkout page does nothing."),
        );
        let score = WeightedJaccard::new().score(
            &Probe::from_text("Submit button doesn't work on checkout"),
            &issue,
            &snapshot,
        );
        // title tokens match exactly; body adds `click` and `page`
        assert!((score - (0.7 + 0.3 * 4.0 / 6.0)).abs() < 1e-9);
    }
}
