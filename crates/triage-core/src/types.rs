//! Core types for triage
//!
//! Defines the inputs and outputs of the pipeline:
//! - submissions
//! - decisions with rationale and flags
//! - reports with lineage and summary

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_model::{FeedbackItem, Fingerprint, ItemId, Kind, Severity};

use crate::error::TriageWarning;

/// One piece of raw feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Submission {
    /// Free text as received
    pub text: String,
    /// Who sent it
    #[serde(default)]
    pub submitter: Option<String>,
    /// When it was received; reference time for decay and reopen windows
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Create submission from text
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            submitter: None,
            received_at: None,
        }
    }

    /// With submitter
    #[inline]
    #[must_use]
    pub fn with_submitter(mut self, submitter: impl Into<String>) -> Self {
        self.submitter = Some(submitter.into());
        self
    }

    /// With receive time
    #[inline]
    #[must_use]
    pub fn received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = Some(at);
        self
    }
}

/// What the caller should do with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// File a new issue
    CreateNew,
    /// Add the item as a comment on an open issue
    CommentOnOpen,
    /// Reopen a closed issue
    ReopenClosed,
}

impl Action {
    /// Whether the action needs a target issue
    #[inline]
    #[must_use]
    pub const fn needs_target(self) -> bool {
        !matches!(self, Self::CreateNew)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateNew => "create-new",
            Self::CommentOnOpen => "comment-on-open",
            Self::ReopenClosed => "reopen-closed",
        })
    }
}

/// Advisory markers on a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionFlag {
    /// An open issue is similar but below the comment threshold
    PossibleDuplicate,
    /// The similarity search did not cover the whole corpus
    TruncatedSearch,
    /// The item lacks detail
    NeedsInfo,
    /// The item hit the split depth limit
    Oversized,
    /// An earlier item of the same submission says nearly the same
    DuplicateOfSibling,
}

/// Outcome for one atomic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Decision {
    /// Chosen action
    pub action: Action,
    /// Issue acted on; set exactly when the action needs one
    pub target_issue: Option<u64>,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Ordered factors behind the decision, never empty
    pub rationale: Vec<String>,
    /// Advisory markers, sorted
    pub flags: Vec<DecisionFlag>,
    /// Issues to link without acting on them
    pub related_issues: Vec<u64>,
}

impl Decision {
    /// New-issue decision
    #[must_use]
    pub fn create_new(confidence: f64) -> Self {
        Self::build(Action::CreateNew, None, confidence)
    }

    /// Comment decision
    #[must_use]
    pub fn comment_on_open(issue: u64, confidence: f64) -> Self {
        Self::build(Action::CommentOnOpen, Some(issue), confidence)
    }

    /// Reopen decision
    #[must_use]
    pub fn reopen_closed(issue: u64, confidence: f64) -> Self {
        Self::build(Action::ReopenClosed, Some(issue), confidence)
    }

    fn build(action: Action, target_issue: Option<u64>, confidence: f64) -> Self {
        Self {
            action,
            target_issue,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: Vec::new(),
            flags: Vec::new(),
            related_issues: Vec::new(),
        }
    }

    /// Append a rationale line
    #[inline]
    pub fn because(&mut self, reason: impl Into<String>) {
        self.rationale.push(reason.into());
    }

    /// Add a flag, keeping flags sorted and unique
    pub fn flag(&mut self, flag: DecisionFlag) {
        if let Err(at) = self.flags.binary_search(&flag) {
            self.flags.insert(at, flag);
        }
    }

    /// Check a flag
    #[inline]
    #[must_use]
    pub fn has_flag(&self, flag: DecisionFlag) -> bool {
        self.flags.binary_search(&flag).is_ok()
    }

    /// Link an issue without acting on it
    pub fn relate(&mut self, issue: u64) {
        if !self.related_issues.contains(&issue) {
            self.related_issues.push(issue);
        }
    }

    /// Scale confidence, staying within `[0, 1]`
    pub fn scale_confidence(&mut self, factor: f64) {
        self.confidence = (self.confidence * factor).clamp(0.0, 1.0);
    }

    /// Target presence matches the action, confidence in range, rationale given
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.action.needs_target() == self.target_issue.is_some()
            && (0.0..=1.0).contains(&self.confidence)
            && !self.rationale.is_empty()
    }
}

/// An atomic item and its decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriageOutcome {
    /// The atomic item
    pub item: FeedbackItem,
    /// What to do with it
    pub decision: Decision,
}

/// Audit backlink for an item replaced by a split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LineageEntry {
    /// Replaced item
    pub id: ItemId,
    /// Its own parent, when it was itself a split child
    pub parent_id: Option<ItemId>,
    /// Its title
    pub title: String,
    /// Items it was split into, in source order
    pub children: Vec<ItemId>,
}

/// Per-report counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriageSummary {
    /// Atomic items
    pub items: usize,
    /// Bug items
    pub bugs: usize,
    /// Feature items
    pub features: usize,
    /// Enhancement items
    pub enhancements: usize,
    /// Critical items
    pub critical: usize,
    /// High-severity items
    pub high: usize,
    /// Items needing more information
    pub needs_info: usize,
    /// New issues to file
    pub create_new: usize,
    /// Comments to add
    pub comment_on_open: usize,
    /// Issues to reopen
    pub reopen_closed: usize,
}

impl TriageSummary {
    /// Count outcomes
    #[must_use]
    pub fn from_outcomes(outcomes: &[TriageOutcome]) -> Self {
        let mut summary = Self::default();
        for TriageOutcome { item, decision } in outcomes {
            summary.items += 1;
            match item.kind {
                Kind::Bug => summary.bugs += 1,
                Kind::Feature => summary.features += 1,
                Kind::Enhancement => summary.enhancements += 1,
            }
            match item.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium | Severity::Low => {}
            }
            if item.needs_info {
                summary.needs_info += 1;
            }
            match decision.action {
                Action::CreateNew => summary.create_new += 1,
                Action::CommentOnOpen => summary.comment_on_open += 1,
                Action::ReopenClosed => summary.reopen_closed += 1,
            }
        }
        summary
    }
}

/// Everything triage decided for one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriageReport {
    /// Digest of the submission text and configuration
    pub fingerprint: Fingerprint,
    /// Snapshot the decisions were made against
    pub snapshot_version: u64,
    /// Digest of the issue records in that snapshot
    pub corpus_fingerprint: Fingerprint,
    /// Reference time for decay and reopen windows
    pub reference_time: DateTime<Utc>,
    /// Scorer used
    pub scorer: String,
    /// Atomic items and decisions, in source order
    pub outcomes: Vec<TriageOutcome>,
    /// Items replaced by splits
    pub lineage: Vec<LineageEntry>,
    /// Non-fatal conditions
    pub warnings: Vec<TriageWarning>,
    /// Counts
    pub summary: TriageSummary,
}

impl TriageReport {
    /// Decisions in source order
    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.outcomes.iter().map(|o| &o.decision)
    }

    /// Outcome for an item id
    #[must_use]
    pub fn outcome(&self, id: &ItemId) -> Option<&TriageOutcome> {
        self.outcomes.iter().find(|o| &o.item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_stay_sorted_and_unique() {
        let mut decision = Decision::create_new(1.0);
        decision.flag(DecisionFlag::TruncatedSearch);
        decision.flag(DecisionFlag::PossibleDuplicate);
        decision.flag(DecisionFlag::TruncatedSearch);
        assert_eq!(
            decision.flags,
            vec![DecisionFlag::PossibleDuplicate, DecisionFlag::TruncatedSearch]
        );
    }

    #[test]
    fn well_formed_requires_target_and_rationale() {
        let mut decision = Decision::comment_on_open(456, 1.3);
        assert_eq!(decision.confidence, 1.0);
        assert!(!decision.is_well_formed());
        decision.because("rule 2");
        assert!(decision.is_well_formed());

        decision.target_issue = None;
        assert!(!decision.is_well_formed());
    }

    #[test]
    fn actions_serialize_kebab_case() {
        let json = serde_json::to_string(&Decision::reopen_closed(123, 0.8)).unwrap();
        assert!(json.contains(r#""action":"reopen-closed""#));
        assert!(json.contains(r#""target-issue":123"#));
        assert_eq!(Action::CommentOnOpen.to_string(), "comment-on-open");
    }
}
