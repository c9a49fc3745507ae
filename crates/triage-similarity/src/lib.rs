//! Issue Similarity
//!
//! Ranks existing tracker issues against a candidate feedback item.
//!
//! # Core Concepts
//!
//! - [`CorpusSnapshot`]: immutable, versioned, pre-tokenized corpus view
//! - [`SnapshotStore`]: linearized publication of snapshot updates
//! - [`SimilarityStrategy`]: pluggable text scorer ([`WeightedJaccard`],
//!   [`TfIdfCosine`]), resolved by name through [`StrategyRegistry`]
//! - [`SimilarityIndex`]: strategy score plus title and component boosts,
//!   closed-issue decay, floor filtering and deterministic ordering
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use triage_model::{FeedbackItem, IssueRecord, ItemId};
//! use triage_similarity::{CorpusSnapshot, QueryBudget, SimilarityIndex};
//!
//! let snapshot = CorpusSnapshot::from_issues(
//!     vec![IssueRecord::open(456, "Checkout submit button unresponsive")],
//!     Utc::now(),
//! );
//! let item = FeedbackItem::new(ItemId::from_index(0), "Submit button unresponsive on checkout");
//! let result = SimilarityIndex::default().query(&item, &snapshot, &QueryBudget::unbounded());
//! assert_eq!(result.best().map(|m| m.issue_number), Some(456));
//! ```

#![warn(unreachable_pub)]

mod error;
mod index;
mod queries;
mod registry;
mod snapshot;
mod store;
pub mod strategies;
mod strategy;

pub use error::SimilarityError;
pub use index::{
    MatchField, QueryBudget, SearchResult, SimilarityConfig, SimilarityIndex, SimilarityMatch,
};
pub use queries::{key_terms, search_queries};
pub use registry::StrategyRegistry;
pub use snapshot::{CorpusSnapshot, CorpusUpdate, IndexedIssue};
pub use store::SnapshotStore;
pub use strategies::{TfIdfCosine, WeightedJaccard};
pub use strategy::{Probe, SimilarityStrategy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
