//! Triage configuration
//!
//! Every threshold the pipeline uses lives in [`TriageConfig`]. Files may set
//! any subset of keys; missing keys keep their defaults and unknown keys are
//! rejected.
//!
//! ```toml
//! similarity_floor = 0.3
//! high_threshold = 0.75
//! reopen_window_days = 60
//! scorer = "tfidf-cosine"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use triage_parser::{ComplexityAnalyzer, FeedbackParser};
use triage_similarity::SimilarityConfig;

use crate::error::ConfigError;

/// Deepest split depth accepted by [`TriageConfig::validate`]
pub const MAX_SPLIT_DEPTH_LIMIT: u32 = 8;

/// Triage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    /// Matches scoring below this are ignored
    pub similarity_floor: f64,
    /// Minimum score to comment on an open issue
    pub high_threshold: f64,
    /// Minimum score to reopen a closed issue
    pub reopen_threshold: f64,
    /// Closed issues older than this are never reopened
    pub reopen_window_days: f64,
    /// Half-life of closed-issue score decay
    pub decay_half_life_days: f64,
    /// Maximum number of successive splits of one item
    pub max_split_depth: u32,
    /// Items with at most this many content tokens are never split
    pub min_atomic_tokens: usize,
    /// Items with fewer content tokens need more information
    pub min_content_tokens: usize,
    /// Content tokens above which repeated topic shifts split an item
    pub long_item_tokens: usize,
    /// Title length bound in characters
    pub max_title_chars: usize,
    /// Score boost for identical issue titles (half when contained)
    pub title_match_boost: f64,
    /// Score boost for a shared component (half for a shared kind label)
    pub label_boost: f64,
    /// Confidence multiplier when the search was truncated
    pub truncated_confidence_penalty: f64,
    /// Title similarity above which a new item duplicates an earlier sibling
    pub sibling_duplicate_threshold: f64,
    /// Registered similarity strategy name
    pub scorer: String,
    /// Bound on fetching the corpus from the repository
    pub fetch_timeout_ms: u64,
    /// Issues scored between deadline checks
    pub query_chunk_size: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            similarity_floor: 0.3,
            high_threshold: 0.75,
            reopen_threshold: 0.6,
            reopen_window_days: 60.0,
            decay_half_life_days: 365.0,
            max_split_depth: triage_parser::DEFAULT_MAX_SPLIT_DEPTH,
            min_atomic_tokens: triage_parser::DEFAULT_MIN_ATOMIC_TOKENS,
            min_content_tokens: triage_parser::DEFAULT_MIN_CONTENT_TOKENS,
            long_item_tokens: triage_parser::DEFAULT_LONG_ITEM_TOKENS,
            max_title_chars: triage_parser::DEFAULT_MAX_TITLE_CHARS,
            title_match_boost: 0.15,
            label_boost: 0.1,
            truncated_confidence_penalty: 0.8,
            sibling_duplicate_threshold: 0.9,
            scorer: "weighted-jaccard".to_string(),
            fetch_timeout_ms: 5_000,
            query_chunk_size: 256,
        }
    }
}

impl TriageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With similarity floor
    #[inline]
    #[must_use]
    pub fn with_similarity_floor(mut self, floor: f64) -> Self {
        self.similarity_floor = floor;
        self
    }

    /// With comment threshold
    #[inline]
    #[must_use]
    pub fn with_high_threshold(mut self, threshold: f64) -> Self {
        self.high_threshold = threshold;
        self
    }

    /// With reopen threshold
    #[inline]
    #[must_use]
    pub fn with_reopen_threshold(mut self, threshold: f64) -> Self {
        self.reopen_threshold = threshold;
        self
    }

    /// With reopen window
    #[inline]
    #[must_use]
    pub fn with_reopen_window_days(mut self, days: f64) -> Self {
        self.reopen_window_days = days;
        self
    }

    /// With decay half-life
    #[inline]
    #[must_use]
    pub fn with_decay_half_life_days(mut self, days: f64) -> Self {
        self.decay_half_life_days = days;
        self
    }

    /// With max split depth
    #[inline]
    #[must_use]
    pub fn with_max_split_depth(mut self, depth: u32) -> Self {
        self.max_split_depth = depth;
        self
    }

    /// With minimum atomic tokens
    #[inline]
    #[must_use]
    pub fn with_min_atomic_tokens(mut self, tokens: usize) -> Self {
        self.min_atomic_tokens = tokens;
        self
    }

    /// With scorer name
    #[inline]
    #[must_use]
    pub fn with_scorer(mut self, scorer: impl Into<String>) -> Self {
        self.scorer = scorer.into();
        self
    }

    /// With fetch timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.fetch_timeout_ms = timeout_ms;
        self
    }

    /// With truncated-search penalty
    #[inline]
    #[must_use]
    pub fn with_truncated_confidence_penalty(mut self, penalty: f64) -> Self {
        self.truncated_confidence_penalty = penalty;
        self
    }

    /// Check ranges and threshold ordering
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("similarity_floor", self.similarity_floor)?;
        unit("high_threshold", self.high_threshold)?;
        unit("reopen_threshold", self.reopen_threshold)?;
        unit("title_match_boost", self.title_match_boost)?;
        unit("label_boost", self.label_boost)?;
        unit("sibling_duplicate_threshold", self.sibling_duplicate_threshold)?;
        unit("truncated_confidence_penalty", self.truncated_confidence_penalty)?;

        if self.high_threshold < self.similarity_floor {
            return Err(ConfigError::invalid(
                "high_threshold",
                "must not be below similarity_floor",
            ));
        }
        if self.reopen_threshold < self.similarity_floor {
            return Err(ConfigError::invalid(
                "reopen_threshold",
                "must not be below similarity_floor",
            ));
        }
        positive("reopen_window_days", self.reopen_window_days)?;
        positive("decay_half_life_days", self.decay_half_life_days)?;

        if self.max_split_depth > MAX_SPLIT_DEPTH_LIMIT {
            return Err(ConfigError::invalid(
                "max_split_depth",
                format!("must be at most {MAX_SPLIT_DEPTH_LIMIT}"),
            ));
        }
        if self.max_title_chars < 4 {
            return Err(ConfigError::invalid("max_title_chars", "must be at least 4"));
        }
        if self.scorer.trim().is_empty() {
            return Err(ConfigError::invalid("scorer", "must not be empty"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::invalid("fetch_timeout_ms", "must be positive"));
        }
        if self.query_chunk_size == 0 {
            return Err(ConfigError::invalid("query_chunk_size", "must be positive"));
        }
        Ok(())
    }

    /// Load from TOML text
    ///
    /// # Errors
    /// Returns error on syntax errors, unknown keys or invalid values
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from YAML text
    ///
    /// # Errors
    /// Returns error on syntax errors, unknown keys or invalid values
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON text
    ///
    /// # Errors
    /// Returns error on syntax errors, unknown keys or invalid values
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, picking the format by extension
    ///
    /// # Errors
    /// Returns error if the file cannot be read, has an unsupported extension,
    /// or does not hold a valid configuration
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let loader: fn(&str) -> Result<Self, ConfigError> = match extension.as_str() {
            "toml" => Self::from_toml_str,
            "yaml" | "yml" => Self::from_yaml_str,
            "json" => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        loader(&input)
    }

    /// Parser built from these settings
    #[must_use]
    pub fn parser(&self) -> FeedbackParser {
        FeedbackParser::new()
            .with_min_content_tokens(self.min_content_tokens)
            .with_max_title_chars(self.max_title_chars)
    }

    /// Splitter built from these settings
    #[must_use]
    pub fn analyzer(&self) -> ComplexityAnalyzer {
        ComplexityAnalyzer::new(self.parser())
            .with_max_depth(self.max_split_depth)
            .with_min_atomic_tokens(self.min_atomic_tokens)
            .with_long_item_tokens(self.long_item_tokens)
    }

    /// Similarity scoring parameters
    #[must_use]
    pub fn similarity(&self) -> SimilarityConfig {
        SimilarityConfig {
            floor: self.similarity_floor,
            title_match_boost: self.title_match_boost,
            label_boost: self.label_boost,
            decay_half_life_days: self.decay_half_life_days,
        }
    }
}

fn unit(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("{value} is outside [0, 1]")))
    }
}

fn positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("{value} must be positive")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TriageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.similarity().floor, 0.3);
        assert_eq!(config.analyzer().max_depth(), 2);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TriageConfig::from_toml_str(
            "high_threshold = 0.8\nreopen_window_days = 30\nscorer = \"tfidf-cosine\"\n",
        )
        .unwrap();
        assert_eq!(config.high_threshold, 0.8);
        assert_eq!(config.reopen_window_days, 30.0);
        assert_eq!(config.scorer, "tfidf-cosine");
        assert_eq!(config.similarity_floor, 0.3);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = TriageConfig::from_json_str(r#"{"similarity_flor": 0.4}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn threshold_order_enforced() {
        let err = TriageConfig::new()
            .with_similarity_floor(0.5)
            .with_high_threshold(0.4)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "high_threshold", .. }));
    }

    #[test]
    fn yaml_out_of_range_rejected() {
        let err = TriageConfig::from_yaml_str("similarity_floor: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "similarity_floor", .. }));
    }

    #[test]
    fn unsupported_extension() {
        let err = TriageConfig::from_path("triage.ini").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
