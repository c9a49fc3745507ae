//! Feedback Triage Core
//!
//! Turns a raw feedback submission into auditable issue-tracker decisions.
//!
//! # Pipeline
//!
//! ```text
//! Submission → FeedbackParser → ComplexityAnalyzer → SimilarityIndex → DecisionEngine
//!                                                          ↑
//!                          IssueRepository → CorpusSnapshot
//! ```
//!
//! Every atomic item ends in exactly one [`Decision`]: create a new issue,
//! comment on an open one, or reopen a closed one. Decisions carry a
//! rationale, flags and links; nothing is ever written to the tracker.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use triage_core::{Action, Submission, TriageConfig, TriageOrchestrator};
//! use triage_similarity::CorpusSnapshot;
//!
//! let orchestrator = TriageOrchestrator::new(TriageConfig::default())?;
//! let report = orchestrator.triage_with_snapshot(
//!     &Submission::new("Login button does not respond on mobile Safari"),
//!     &CorpusSnapshot::empty(Utc::now()),
//! )?;
//! assert_eq!(report.outcomes[0].decision.action, Action::CreateNew);
//! # Ok::<(), triage_core::TriageError>(())
//! ```

#![warn(unreachable_pub)]

mod config;
mod decision;
mod error;
mod orchestrator;
mod repository;
mod types;

pub use config::{TriageConfig, MAX_SPLIT_DEPTH_LIMIT};
pub use decision::DecisionEngine;
pub use error::{ConfigError, RepositoryError, TriageError, TriageWarning};
pub use orchestrator::TriageOrchestrator;
pub use repository::{IssueDraft, IssueRepository};
pub use types::{
    Action, Decision, DecisionFlag, LineageEntry, Submission, TriageOutcome, TriageReport,
    TriageSummary,
};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        Action, Decision, DecisionFlag, IssueRepository, Submission, TriageConfig, TriageError,
        TriageOrchestrator, TriageReport,
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
