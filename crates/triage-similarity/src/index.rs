//! Similarity index
//!
//! Ranks issues of a [`CorpusSnapshot`] against a candidate item:
//!
//! ```text
//! score = clamp(strategy + title boost + component/label boost) × decay
//! decay = 0.5 ^ (days_since_closed / half_life)      (1.0 for open issues)
//! ```
//!
//! Matches below the floor are dropped. Results are ordered by score, then
//! most recent activity, then issue number, which makes the ranking
//! independent of corpus iteration order.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use triage_model::FeedbackItem;

use crate::error::SimilarityError;
use crate::snapshot::{CorpusSnapshot, IndexedIssue};
use crate::strategies::WeightedJaccard;
use crate::strategy::{Probe, SimilarityStrategy};

/// Which parts of an issue contributed to a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchField {
    /// Shares tokens with the issue title
    Title,
    /// Same token set as the issue title
    TitleExact,
    /// Issue title tokens are all present in the item
    TitleContained,
    /// Shares tokens with the issue body
    Body,
    /// Item kind appears in the issue labels
    Labels,
    /// Same component
    Component,
}

/// One ranked issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimilarityMatch {
    /// Matched issue
    pub issue_number: u64,
    /// Final score in `[0, 1]`
    pub score: f64,
    /// Strategy score before boosts and decay
    pub text_score: f64,
    /// Decay factor applied (1.0 for open issues)
    pub decay: f64,
    /// Contributing fields, sorted
    pub matched_fields: Vec<MatchField>,
}

/// Ranked matches for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchResult {
    /// Matches at or above the floor, best first
    pub matches: Vec<SimilarityMatch>,
    /// Deadline passed before the whole corpus was scored
    pub truncated: bool,
    /// Issues scored
    pub scanned: usize,
    /// Issues in the snapshot
    pub corpus_size: usize,
    /// Snapshot version the result was computed against
    pub snapshot_version: u64,
    /// Strategy that produced the text scores
    pub strategy: String,
}

impl SearchResult {
    /// Best match, if any
    #[inline]
    #[must_use]
    pub fn best(&self) -> Option<&SimilarityMatch> {
        self.matches.first()
    }

    /// Highest score, 0.0 when nothing matched
    #[inline]
    #[must_use]
    pub fn best_score(&self) -> f64 {
        self.best().map_or(0.0, |m| m.score)
    }
}

/// Time budget for one query
#[derive(Debug, Clone, Copy)]
pub struct QueryBudget {
    deadline: Option<Instant>,
    chunk_size: usize,
}

impl Default for QueryBudget {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl QueryBudget {
    /// Default number of issues scored between deadline checks
    pub const DEFAULT_CHUNK_SIZE: usize = 256;

    /// No deadline
    #[inline]
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            deadline: None,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Deadline at an instant
    #[inline]
    #[must_use]
    pub const fn until(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Deadline relative to now
    #[inline]
    #[must_use]
    pub fn within(timeout: Duration) -> Self {
        Self::until(Instant::now() + timeout)
    }

    /// With chunk size (at least 1)
    #[inline]
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Deadline, if any
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Scoring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimilarityConfig {
    /// Matches below this are dropped
    pub floor: f64,
    /// Added when the title tokens are identical (half when contained)
    pub title_match_boost: f64,
    /// Added when components match (half for a shared kind label)
    pub label_boost: f64,
    /// Half-life of closed-issue decay, in days
    pub decay_half_life_days: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            floor: 0.3,
            title_match_boost: 0.15,
            label_boost: 0.1,
            decay_half_life_days: 365.0,
        }
    }
}

impl SimilarityConfig {
    /// Check ranges
    ///
    /// # Errors
    /// Returns error for out-of-range values
    pub fn validate(&self) -> Result<(), SimilarityError> {
        if !(0.0..=1.0).contains(&self.floor) {
            return Err(SimilarityError::invalid_parameter("floor", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.title_match_boost) {
            return Err(SimilarityError::invalid_parameter(
                "title_match_boost",
                "must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.label_boost) {
            return Err(SimilarityError::invalid_parameter("label_boost", "must be within [0, 1]"));
        }
        if !(self.decay_half_life_days > 0.0 && self.decay_half_life_days.is_finite()) {
            return Err(SimilarityError::invalid_parameter(
                "decay_half_life_days",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Ranks snapshot issues against candidate items
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    strategy: Arc<dyn SimilarityStrategy>,
    config: SimilarityConfig,
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new(Arc::new(WeightedJaccard::new()))
    }
}

impl SimilarityIndex {
    /// Create index with a strategy and default parameters
    #[inline]
    #[must_use]
    pub fn new(strategy: Arc<dyn SimilarityStrategy>) -> Self {
        Self {
            strategy,
            config: SimilarityConfig::default(),
        }
    }

    /// With scoring parameters
    ///
    /// # Errors
    /// Returns error if the parameters are out of range
    pub fn with_config(mut self, config: SimilarityConfig) -> Result<Self, SimilarityError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Strategy in use
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &dyn SimilarityStrategy {
        self.strategy.as_ref()
    }

    /// Scoring parameters
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Rank the snapshot against an item
    ///
    /// The first chunk of the corpus is always scored; later chunks are
    /// skipped once the budget's deadline has passed and the result is marked
    /// truncated.
    #[must_use]
    pub fn query(
        &self,
        item: &FeedbackItem,
        snapshot: &CorpusSnapshot,
        budget: &QueryBudget,
    ) -> SearchResult {
        let probe = Probe::from_item(item);
        let mut matches = Vec::new();
        let mut scanned = 0;
        let mut truncated = false;

        let issues: Vec<&Arc<IndexedIssue>> = snapshot.iter().collect();
        for (chunk_index, chunk) in issues.chunks(budget.chunk_size).enumerate() {
            if chunk_index > 0 && budget.expired() {
                truncated = true;
                break;
            }
            for issue in chunk {
                scanned += 1;
                if let Some(m) = self.score_issue(&probe, issue, snapshot) {
                    matches.push(m);
                }
            }
        }

        matches.sort_by(|a, b| rank(a, b, snapshot));

        if truncated {
            warn!(
                item = %item.id,
                scanned,
                corpus = snapshot.len(),
                "similarity query deadline reached, result truncated"
            );
        }
        debug!(
            item = %item.id,
            snapshot = snapshot.version(),
            strategy = self.strategy.name(),
            matches = matches.len(),
            "similarity query"
        );

        SearchResult {
            matches,
            truncated,
            scanned,
            corpus_size: snapshot.len(),
            snapshot_version: snapshot.version(),
            strategy: self.strategy.name().to_string(),
        }
    }

    /// Score one issue; `None` when below the floor
    #[must_use]
    pub fn score_issue(
        &self,
        probe: &Probe,
        issue: &IndexedIssue,
        snapshot: &CorpusSnapshot,
    ) -> Option<SimilarityMatch> {
        let text_score = self.strategy.score(probe, issue, snapshot).clamp(0.0, 1.0);
        let mut fields = Vec::new();
        let mut boost = 0.0;

        if !probe.token_set.is_disjoint(&issue.title_set) {
            fields.push(MatchField::Title);
        }
        if !issue.title_set.is_empty() {
            if probe.title_set == issue.title_set || probe.token_set == issue.title_set {
                fields.push(MatchField::TitleExact);
                boost += self.config.title_match_boost;
            } else if issue.title_set.is_subset(&probe.token_set) {
                fields.push(MatchField::TitleContained);
                boost += self.config.title_match_boost / 2.0;
            }
        }
        if issue
            .body_tokens
            .iter()
            .any(|token| probe.token_set.contains(token))
        {
            fields.push(MatchField::Body);
        }

        let same_component = match (&probe.component, &issue.component) {
            (Some(ours), Some(theirs)) => ours == theirs || issue.labels.contains(ours),
            (Some(ours), None) => issue.labels.contains(ours),
            _ => false,
        };
        if same_component {
            fields.push(MatchField::Component);
            boost += self.config.label_boost;
        }
        if !probe.kind_label.is_empty() && issue.labels.contains(&probe.kind_label) {
            fields.push(MatchField::Labels);
            boost += self.config.label_boost / 2.0;
        }

        // Boosts only amplify textual overlap; they never create a match alone
        if text_score <= 0.0 {
            return None;
        }

        let decay = issue
            .issue
            .days_since_closed(snapshot.as_of())
            .map_or(1.0, |days| 0.5_f64.powf(days / self.config.decay_half_life_days));
        let score = ((text_score + boost).clamp(0.0, 1.0) * decay).clamp(0.0, 1.0);

        if score < self.config.floor {
            return None;
        }

        fields.sort();
        Some(SimilarityMatch {
            issue_number: issue.number(),
            score,
            text_score,
            decay,
            matched_fields: fields,
        })
    }
}

/// Score desc, then most recent activity desc, then issue number asc
fn rank(a: &SimilarityMatch, b: &SimilarityMatch, snapshot: &CorpusSnapshot) -> Ordering {
    let activity = |m: &SimilarityMatch| {
        snapshot
            .issue(m.issue_number)
            .and_then(triage_model::IssueRecord::last_activity)
    };

    b.score
        .total_cmp(&a.score)
        .then_with(|| activity(b).cmp(&activity(a)))
        .then_with(|| a.issue_number.cmp(&b.issue_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::TfIdfCosine;
    use chrono::{DateTime, Duration as Days, TimeZone, Utc};
    use triage_model::{IssueRecord, ItemId};
    use triage_parser::FeedbackParser;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn item(text: &str) -> FeedbackItem {
        FeedbackParser::new().derive(ItemId::from_index(0), text)
    }

    fn strategies() -> Vec<Arc<dyn SimilarityStrategy>> {
        vec![Arc::new(WeightedJaccard::new()), Arc::new(TfIdfCosine::new())]
    }

    #[test]
    fn empty_corpus_has_no_matches() {
        let snapshot = CorpusSnapshot::empty(t0());
        for strategy in strategies() {
            let result = SimilarityIndex::new(strategy).query(
                &item("Login button does not respond on mobile Safari"),
                &snapshot,
                &QueryBudget::unbounded(),
            );
            assert!(result.matches.is_empty());
            assert!(!result.truncated);
            assert_eq!(result.best_score(), 0.0);
        }
    }

    #[test]
    fn paraphrase_ranks_first_with_fields() {
        let snapshot = CorpusSnapshot::from_issues(
            vec![
                IssueRecord::open(456, "Checkout submit button unresponsive")
                    .with_body("Clicking submit on the checkout page does nothing."),
                IssueRecord::closed(123, "Login broken on mobile", t0() - Days::days(10)),
            ],
            t0(),
        );
        for strategy in strategies() {
            let result = SimilarityIndex::new(strategy).query(
                &item("Submit button doesn't work on checkout"),
                &snapshot,
                &QueryBudget::unbounded(),
            );
            let best = result.best().unwrap();
            assert_eq!(best.issue_number, 456);
            assert!(best.score >= 0.75);
            assert!(best.matched_fields.contains(&MatchField::TitleExact));
            assert!(best.matched_fields.contains(&MatchField::Component));
            assert_eq!(result.matches.len(), 1);
        }
    }

    #[test]
    fn closed_issues_decay() {
        let recent = IssueRecord::closed(1, "Export to CSV fails", t0() - Days::days(10));
        let old = IssueRecord::closed(2, "Export to CSV fails", t0() - Days::days(365));
        let snapshot = CorpusSnapshot::from_issues(vec![old, recent], t0());

        let result = SimilarityIndex::default().query(
            &item("Export to CSV fails"),
            &snapshot,
            &QueryBudget::unbounded(),
        );
        assert_eq!(result.matches[0].issue_number, 1);
        assert!((result.matches[1].decay - 0.5).abs() < 1e-9);
        assert!(result.matches[1].score < result.matches[0].score);
    }

    #[test]
    fn ties_break_on_activity_then_number() {
        let snapshot = CorpusSnapshot::from_issues(
            vec![
                IssueRecord::open(9, "Search filter broken").with_updated_at(t0() - Days::days(5)),
                IssueRecord::open(3, "Search filter broken").with_updated_at(t0() - Days::days(5)),
                IssueRecord::open(7, "Search filter broken").with_updated_at(t0() - Days::days(1)),
            ],
            t0(),
        );
        let result = SimilarityIndex::default().query(
            &item("Search filter broken"),
            &snapshot,
            &QueryBudget::unbounded(),
        );
        let order: Vec<u64> = result.matches.iter().map(|m| m.issue_number).collect();
        assert_eq!(order, vec![7, 3, 9]);
    }

    #[test]
    fn expired_deadline_scores_first_chunk_only() {
        let issues = (1..=10).map(|n| IssueRecord::open(n, "Upload fails for large files"));
        let snapshot = CorpusSnapshot::from_issues(issues, t0());
        let budget = QueryBudget::until(Instant::now()).with_chunk_size(4);

        let result = SimilarityIndex::default().query(&item("Upload fails"), &snapshot, &budget);
        assert!(result.truncated);
        assert_eq!(result.scanned, 4);
        assert_eq!(result.corpus_size, 10);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = SimilarityConfig {
            decay_half_life_days: 0.0,
            ..SimilarityConfig::default()
        };
        assert!(SimilarityIndex::default().with_config(config).is_err());
    }
}
