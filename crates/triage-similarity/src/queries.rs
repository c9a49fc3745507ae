//! Tracker search strings
//!
//! For callers that pre-filter a remote corpus before building a snapshot.
//! Queries use the common `term term label:x` search syntax.

use triage_model::{text, FeedbackItem};

const MIN_TERM_CHARS: usize = 4;
const MAX_QUERIES: usize = 3;

/// Key title terms: longer than three characters, not stop words, first occurrence only
#[must_use]
pub fn key_terms(title: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text::words(title) {
        if word.chars().count() < MIN_TERM_CHARS || text::is_stop_word(&word) {
            continue;
        }
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

/// Search strings for an item, most specific first
///
/// 1. the first three key title terms
/// 2. the first two key terms scoped to the item's first two labels
/// 3. the labels alone
///
/// Empty and repeated queries are skipped.
#[must_use]
pub fn search_queries(item: &FeedbackItem) -> Vec<String> {
    let terms = key_terms(&item.title);
    let labels: Vec<String> = item.labels().iter().map(|l| format!("label:{l}")).collect();

    let candidates = [
        terms.iter().take(3).cloned().collect::<Vec<_>>().join(" "),
        terms
            .iter()
            .take(2)
            .chain(labels.iter().take(2))
            .cloned()
            .collect::<Vec<_>>()
            .join(" "),
        labels.join(" "),
    ];

    let mut queries: Vec<String> = Vec::with_capacity(MAX_QUERIES);
    for query in candidates {
        if !query.is_empty() && !queries.contains(&query) {
            queries.push(query);
        }
    }
    queries
}
