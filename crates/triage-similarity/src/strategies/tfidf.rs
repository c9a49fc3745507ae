//! TF-IDF cosine strategy
//!
//! Term weights are `tf × idf` with smoothed inverse document frequency
//! `ln((N + 1) / (df + 1)) + 1` taken from the snapshot, so rare terms count
//! more than terms every issue shares. Title terms are counted twice in the
//! issue vector.

use std::collections::BTreeMap;

use crate::snapshot::{CorpusSnapshot, IndexedIssue};
use crate::strategy::{Probe, SimilarityStrategy};

/// Cosine similarity of TF-IDF vectors
#[derive(Debug, Clone, Copy)]
pub struct TfIdfCosine {
    title_repeat: u32,
}

impl Default for TfIdfCosine {
    fn default() -> Self {
        Self::new()
    }
}

impl TfIdfCosine {
    /// Strategy name
    pub const NAME: &'static str = "tfidf-cosine";

    /// Default: title terms counted twice
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { title_repeat: 2 }
    }

    /// With title repeat factor (at least 1)
    #[inline]
    #[must_use]
    pub fn with_title_repeat(mut self, repeat: u32) -> Self {
        self.title_repeat = repeat.max(1);
        self
    }

    fn idf(snapshot: &CorpusSnapshot, token: &str) -> f64 {
        let n = snapshot.len() as f64;
        let df = snapshot.doc_freq(token) as f64;
        ((n + 1.0) / (df + 1.0)).ln() + 1.0
    }
}

fn term_counts<'a>(tokens: impl IntoIterator<Item = &'a String>) -> BTreeMap<&'a str, f64> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

impl SimilarityStrategy for TfIdfCosine {
    fn score(&self, probe: &Probe, issue: &IndexedIssue, snapshot: &CorpusSnapshot) -> f64 {
        let probe_tf = term_counts(&probe.tokens);

        let mut issue_tf = term_counts(&issue.body_tokens);
        for token in &issue.title_tokens {
            *issue_tf.entry(token.as_str()).or_insert(0.0) += f64::from(self.title_repeat);
        }

        let weight = |token: &str, tf: f64| tf * Self::idf(snapshot, token);

        let mut dot = 0.0;
        let mut probe_norm = 0.0;
        for (token, tf) in &probe_tf {
            let w = weight(*token, *tf);
            probe_norm += w * w;
            if let Some(issue_count) = issue_tf.get(token) {
                dot += w * weight(*token, *issue_count);
            }
        }
        let issue_norm: f64 = issue_tf
            .iter()
            .map(|(token, tf)| weight(*token, *tf).powi(2))
            .sum();

        if probe_norm <= 0.0 || issue_norm <= 0.0 {
            return 0.0;
        }
        (dot / (probe_norm.sqrt() * issue_norm.sqrt())).clamp(0.0, 1.0)
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

    fn snapshot() -> CorpusSnapshot {
        CorpusSnapshot::from_issues(
            vec![
                IssueRecord::open(456, "Checkout submit button unresponsive")
                    .with_body("Clicking submit on the checkout page does nothing."),
                IssueRecord::open(123, "Login broken on mobile"),
                IssueRecord::open(77, "Search filter ignores dates"),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn close_paraphrase_scores_high() {
        let snapshot = snapshot();
        let score = TfIdfCosine::new().score(
            &Probe::from_text("Submit button doesn't work on checkout"),
            snapshot.get(456).unwrap(),
            &snapshot,
        );
        assert!(score > 0.9, "score was {score}");
    }

    #[test]
    fn shared_common_term_scores_low() {
        let snapshot = snapshot();
        let score = TfIdfCosine::new().score(
            &Probe::from_text("Submit button doesn't work on checkout"),
            snapshot.get(123).unwrap(),
            &snapshot,
        );
        assert!(score < 0.3, "score was {score}");
    }

    #[test]
    fn empty_probe_scores_zero() {
        let snapshot = snapshot();
        let score = TfIdfCosine::new().score(&Probe::from_text("the"), snapshot.get(77).unwrap(), &snapshot);
        assert_eq!(score, 0.0);
    }
}
