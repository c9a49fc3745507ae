//! Decision rules
//!
//! Rules are tried in order; the first that applies decides:
//!
//! 1. nothing at or above the floor: create new
//! 2. best is open, scores at least `high_threshold`, same component: comment
//! 3. best is closed, scores at least `reopen_threshold`, closed within the
//!    window, not won't-fixed, and the item signals a regression: reopen
//! 4. best is closed otherwise: create new, linking the old issue
//! 5. best is open below `high_threshold`: create new, possible duplicate
//!
//! An open match at or above `high_threshold` in another component falls
//! through to rule 5's outcome.

use triage_model::{normalize_component, FeedbackItem, IssueRecord, Severity};
use triage_parser::rules;
use triage_similarity::{CorpusSnapshot, IndexedIssue, MatchField, SearchResult, SimilarityMatch};

use crate::config::TriageConfig;
use crate::error::TriageError;
use crate::types::{Decision, DecisionFlag};

/// Applies the ordered decision rules
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionEngine {
    floor: f64,
    high_threshold: f64,
    reopen_threshold: f64,
    reopen_window_days: f64,
    truncated_penalty: f64,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::from_config(&TriageConfig::default())
    }
}

impl DecisionEngine {
    /// Engine with thresholds from a configuration
    #[must_use]
    pub fn from_config(config: &TriageConfig) -> Self {
        Self {
            floor: config.similarity_floor,
            high_threshold: config.high_threshold,
            reopen_threshold: config.reopen_threshold,
            reopen_window_days: config.reopen_window_days,
            truncated_penalty: config.truncated_confidence_penalty,
        }
    }

    /// Decide what to do with an item given its ranked matches
    ///
    /// # Errors
    /// Returns [`TriageError::SnapshotMismatch`] when the search was ranked
    /// against another snapshot or its best match is missing from `snapshot`
    pub fn decide(
        &self,
        item: &FeedbackItem,
        search: &SearchResult,
        snapshot: &CorpusSnapshot,
    ) -> Result<Decision, TriageError> {
        let best = search.best().filter(|m| m.score >= self.floor);

        let mut decision = match best {
            None => {
                let mut decision = Decision::create_new(1.0 - search.best_score());
                decision.because(format!(
                    "rule 1: no existing issue scores at or above {:.2} ({} of {} scanned)",
                    self.floor, search.scanned, search.corpus_size
                ));
                decision
            }
            Some(best) => {
                if search.snapshot_version != snapshot.version() {
                    return Err(TriageError::SnapshotMismatch {
                        issue: best.issue_number,
                        snapshot_version: snapshot.version(),
                    });
                }
                let indexed = snapshot
                    .get(best.issue_number)
                    .ok_or(TriageError::SnapshotMismatch {
                        issue: best.issue_number,
                        snapshot_version: snapshot.version(),
                    })?;

                if indexed.issue.is_open() {
                    self.against_open(item, indexed, best)
                } else {
                    self.against_closed(item, &indexed.issue, best, snapshot)
                }
            }
        };

        if let Some(best) = best {
            decision.because(format!(
                "best match #{} score {:.2} via {} (text {:.2}, decay {:.2}), matched {}",
                best.issue_number,
                best.score,
                search.strategy,
                best.text_score,
                best.decay,
                fields(&best.matched_fields)
            ));
        }

        if search.truncated {
            decision.scale_confidence(self.truncated_penalty);
            decision.flag(DecisionFlag::TruncatedSearch);
            decision.because(format!(
                "search truncated after {} of {} issues, confidence x{:.2}",
                search.scanned, search.corpus_size, self.truncated_penalty
            ));
        }
        if item.needs_info {
            decision.flag(DecisionFlag::NeedsInfo);
            decision.because("item needs more information");
        }
        if item.oversized {
            decision.flag(DecisionFlag::Oversized);
            decision.because("item kept unsplit at the split depth limit");
        }

        Ok(decision)
    }

    fn against_open(
        &self,
        item: &FeedbackItem,
        indexed: &IndexedIssue,
        best: &SimilarityMatch,
    ) -> Decision {
        let issue = &indexed.issue;
        let item_component = item.component.as_deref().and_then(normalize_component);
        let same_component = best.matched_fields.contains(&MatchField::Component)
            || item_component == indexed.component;

        if best.score >= self.high_threshold && same_component {
            let mut decision = Decision::comment_on_open(issue.number, best.score);
            decision.because(format!(
                "rule 2: open #{} scores {:.2} >= {:.2} in the same component",
                issue.number, best.score, self.high_threshold
            ));
            return decision;
        }

        let mut decision = Decision::create_new(1.0 - best.score);
        decision.flag(DecisionFlag::PossibleDuplicate);
        decision.relate(issue.number);
        if best.score >= self.high_threshold {
            decision.because(format!(
                "rule 5: open #{} scores {:.2} but belongs to another component",
                issue.number, best.score
            ));
        } else {
            decision.because(format!(
                "rule 5: open #{} scores {:.2}, below {:.2}",
                issue.number, best.score, self.high_threshold
            ));
        }
        decision
    }

    fn against_closed(
        &self,
        item: &FeedbackItem,
        issue: &IssueRecord,
        best: &SimilarityMatch,
        snapshot: &CorpusSnapshot,
    ) -> Decision {
        let age = issue.days_since_closed(snapshot.as_of());
        let regression = regression_signal(item, issue);

        let blocker = match age {
            None => Some("closure date unknown, reopen window cannot be checked".to_string()),
            Some(age) if age > self.reopen_window_days => Some(format!(
                "closed {age:.0} days ago, outside the {:.0}-day window",
                self.reopen_window_days
            )),
            Some(_) if best.score < self.reopen_threshold => Some(format!(
                "scores {:.2}, below {:.2}",
                best.score, self.reopen_threshold
            )),
            Some(_) if issue.is_wont_fix() => Some("was closed as won't fix".to_string()),
            Some(_) if regression.is_none() => {
                Some("no regression signal in the feedback".to_string())
            }
            Some(_) => None,
        };

        match (blocker, regression, age) {
            (None, Some(signal), Some(age)) => {
                let recency = 1.0 - 0.5 * (age / self.reopen_window_days);
                let mut decision = Decision::reopen_closed(issue.number, best.score * recency);
                decision.because(format!(
                    "rule 3: closed #{} scores {:.2} >= {:.2}, closed {age:.0} days ago, {signal}",
                    issue.number, best.score, self.reopen_threshold
                ));
                decision
            }
            (blocker, _, _) => {
                let mut decision = Decision::create_new(1.0 - best.score);
                decision.relate(issue.number);
                decision.because(format!(
                    "rule 4: closed #{} {}; linking instead of reopening",
                    issue.number,
                    blocker.unwrap_or_default()
                ));
                decision
            }
        }
    }
}

/// Why the item looks like the issue came back, if it does
fn regression_signal(item: &FeedbackItem, issue: &IssueRecord) -> Option<String> {
    if rules::has_regression_language(&item.raw_text) {
        return Some("regression language present".to_string());
    }
    let previous = issue.severity_from_labels()?;
    (item.severity > previous && item.severity >= Severity::High).then(|| {
        format!("severity escalated from {previous} to {}", item.severity)
    })
}

fn fields(matched: &[MatchField]) -> String {
    if matched.is_empty() {
        return "nothing".to_string();
    }
    matched
        .iter()
        .map(|f| match f {
            MatchField::Title => "title",
            MatchField::TitleExact => "title-exact",
            MatchField::TitleContained => "title-contained",
            MatchField::Body => "body",
            MatchField::Labels => "labels",
            MatchField::Component => "component",
        })
        .collect::<Vec<_>>()
        .join(", ")
}
