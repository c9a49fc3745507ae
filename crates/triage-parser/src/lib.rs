//! Feedback Parsing
//!
//! Turns free-text feedback into atomic, classified [`FeedbackItem`]s.
//!
//! # Pipeline
//!
//! 1. [`FeedbackParser::parse`] segments text (enumerations, paragraphs,
//!    topic shifts) and derives kind, severity, component and structured
//!    fields for each segment from the [`rules`] tables.
//! 2. [`ComplexityAnalyzer::analyze`] splits items that still bundle several
//!    problems, bounded by a maximum split depth.
//!
//! # Example
//!
//! ```rust
//! use triage_parser::{ComplexityAnalyzer, FeedbackParser};
//!
//! let parser = FeedbackParser::new();
//! let items = parser.parse("Login is broken, password reset doesn't work, and we need 2FA")?;
//! let outcome = ComplexityAnalyzer::new(parser).analyze_all(items);
//! assert_eq!(outcome.atomic.len(), 3);
//! # Ok::<(), triage_parser::ParseError>(())
//! ```
//!
//! [`FeedbackItem`]: triage_model::FeedbackItem

#![warn(unreachable_pub)]

mod error;
pub mod extract;
mod parser;
pub mod rules;
mod segment;
mod split;

pub use error::{ParseError, ParseWarning};
pub use parser::{FeedbackParser, DEFAULT_MAX_TITLE_CHARS, DEFAULT_MIN_CONTENT_TOKENS};
pub use segment::{has_own_subject, segment};
pub use split::{
    ComplexityAnalyzer, SplitOutcome, SplitTrigger, DEFAULT_LONG_ITEM_TOKENS,
    DEFAULT_MAX_SPLIT_DEPTH, DEFAULT_MIN_ATOMIC_TOKENS,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
