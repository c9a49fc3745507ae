//! Feedback Triage Model
//!
//! Shared vocabulary for the triage pipeline.
//!
//! # Core Concepts
//!
//! - [`FeedbackItem`]: one unit of user feedback with its classification
//! - [`ItemId`]: hierarchical, deterministic item identifier (`1`, `1.2`)
//! - [`IssueRecord`]: an existing issue in the tracker corpus
//! - [`Fingerprint`]: 32-byte Blake3 digest for audit correlation
//! - [`text`]: tokenizer, stop words, stemming and the component lexicon
//!
//! # Example
//!
//! ```rust
//! use triage_model::{text, FeedbackItem, ItemId, Kind};
//!
//! let item = FeedbackItem::new(ItemId::from_index(0), "Checkout button broken")
//!     .with_kind(Kind::Bug);
//! assert_eq!(item.id.to_string(), "1");
//! assert_eq!(text::primary_component(&item.title), Some("checkout"));
//! ```

#![warn(unreachable_pub)]

mod feedback;
mod fingerprint;
mod id;
mod issue;
pub mod text;

pub use feedback::{FeedbackItem, Kind, Severity, UnknownVariant};
pub use fingerprint::{Fingerprint, FingerprintError};
pub use id::{IdError, ItemId};
pub use issue::{normalize_component, IssueRecord, IssueState};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        FeedbackItem, Fingerprint, IssueRecord, IssueState, ItemId, Kind, Severity,
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
