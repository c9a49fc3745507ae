//! Error types for feedback triage
//!
//! [`TriageError`] is the only error a submission can end with. Conditions
//! that let processing continue are [`TriageWarning`]s collected in the
//! report instead.

use std::path::PathBuf;

use triage_parser::ParseError;
use triage_similarity::SimilarityError;

pub use triage_parser::ParseWarning as TriageWarning;

/// Main triage error type
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// Empty or unparseable feedback, rejected before any item exists
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Structured feedback could not be read
    #[error("parse failed: {0}")]
    Parse(ParseError),

    /// Issue corpus could not be fetched
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(#[from] RepositoryError),

    /// A ranked match does not resolve in the snapshot it was ranked against
    #[error("snapshot mismatch: issue #{issue} not in snapshot v{snapshot_version}")]
    SnapshotMismatch {
        /// Issue the search result referred to
        issue: u64,
        /// Snapshot the decision was asked to use
        snapshot_version: u64,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scorer could not be resolved or configured
    #[error("similarity error: {0}")]
    Similarity(#[from] SimilarityError),
}

impl TriageError {
    /// Check if the error aborts the whole submission
    ///
    /// Only rejected input is not fatal: the caller can fix the text and
    /// resubmit. A fatal repository error may still be retryable.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidInput(_) | Self::Parse(_))
    }

    /// Check if the caller may retry the same submission
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RepositoryUnavailable(e) if e.is_retryable())
    }

    /// Create invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}

impl From<ParseError> for TriageError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidInput(reason) => Self::InvalidInput(reason),
            other => Self::Parse(other),
        }
    }
}

/// Issue repository errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// Backend could not be reached
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// Fetch exceeded its time bound
    #[error("fetch timed out after {after_ms}ms")]
    Timeout {
        /// Configured bound
        after_ms: u64,
    },

    /// Issue does not exist
    #[error("issue #{0} not found")]
    NotFound(u64),

    /// Backend refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// No repository was attached to the orchestrator
    #[error("no issue repository configured")]
    NotConfigured,
}

impl RepositoryError {
    /// Check if a later attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout { .. })
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML syntax or shape error
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or shape error
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is not toml, yaml, yml or json
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// Value outside its valid range
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create invalid value error
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_errors_become_invalid_input() {
        let err: TriageError = ParseError::invalid_input("feedback is empty").into();
        assert!(matches!(err, TriageError::InvalidInput(ref r) if r == "feedback is empty"));
        assert!(!err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn repository_errors_retryable_when_transient() {
        let timeout: TriageError = RepositoryError::Timeout { after_ms: 5000 }.into();
        assert!(timeout.is_retryable());
        assert!(timeout.to_string().contains("5000ms"));

        assert!(timeout.is_fatal());

        let missing: TriageError = RepositoryError::NotConfigured.into();
        assert!(!missing.is_retryable());
        assert!(missing.is_fatal());
    }

    #[test]
    fn snapshot_mismatch_is_fatal() {
        let err = TriageError::SnapshotMismatch {
            issue: 456,
            snapshot_version: 3,
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "snapshot mismatch: issue #456 not in snapshot v3");
    }
}
