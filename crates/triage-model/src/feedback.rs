//! Feedback items and their classification

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::ItemId;

/// What a feedback item asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// Something is broken
    Bug,
    /// Something new is requested
    Feature,
    /// Something existing should work better
    Enhancement,
}

impl Kind {
    /// All kinds, in tie-break order
    pub const ALL: [Self; 3] = [Self::Bug, Self::Feature, Self::Enhancement];

    /// Tracker label for this kind
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Enhancement => "enhancement",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Kind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bug" => Ok(Self::Bug),
            "feature" | "feature-request" | "feature request" => Ok(Self::Feature),
            "enhancement" | "improvement" => Ok(Self::Enhancement),
            other => Err(UnknownVariant::new("kind", other)),
        }
    }
}

/// Severity, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Cosmetic or isolated
    Low,
    /// Default when no escalation signal is present
    #[default]
    Medium,
    /// Broken for many users
    High,
    /// Outage, data loss or security
    Critical,
}

impl Severity {
    /// Tracker label for this severity
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "minor" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" | "major" => Ok(Self::High),
            "critical" | "blocker" | "urgent" => Ok(Self::Critical),
            other => Err(UnknownVariant::new("severity", other)),
        }
    }
}

/// Unrecognized enum text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field}: {value:?}")]
pub struct UnknownVariant {
    /// Which enum was being parsed
    pub field: &'static str,
    /// Rejected text
    pub value: String,
}

impl UnknownVariant {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// One atomic (or not yet split) unit of feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeedbackItem {
    /// Hierarchical identifier, stable for identical input
    pub id: ItemId,
    /// Source text this item was derived from
    pub raw_text: String,
    /// Classified kind
    pub kind: Kind,
    /// Classified severity
    pub severity: Severity,
    /// Short title (first sentence, bounded length)
    pub title: String,
    /// Full description
    pub description: String,
    /// Reproduction steps, possibly empty
    #[serde(default)]
    pub steps_to_reproduce: Vec<String>,
    /// What the reporter expected
    #[serde(default)]
    pub expected_behavior: Option<String>,
    /// What actually happened
    #[serde(default)]
    pub actual_behavior: Option<String>,
    /// Product component, if one was recognized
    #[serde(default)]
    pub component: Option<String>,
    /// Whether more information is needed before acting
    pub needs_info: bool,
    /// Item this one was split out of
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    /// Number of splits that produced this item
    #[serde(default)]
    pub split_depth: u32,
    /// Kept unsplit because the split depth limit was reached
    #[serde(default)]
    pub oversized: bool,
    /// Winning share of classification weight, 0 when no signal matched
    #[serde(default)]
    pub classification_confidence: f64,
}

impl FeedbackItem {
    /// Create an item with default classification
    #[must_use]
    pub fn new(id: ItemId, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        Self {
            id,
            title: raw_text.trim().to_string(),
            description: raw_text.trim().to_string(),
            raw_text,
            kind: Kind::Bug,
            severity: Severity::Medium,
            steps_to_reproduce: Vec::new(),
            expected_behavior: None,
            actual_behavior: None,
            component: None,
            needs_info: true,
            parent_id: None,
            split_depth: 0,
            oversized: false,
            classification_confidence: 0.0,
        }
    }

    /// Set kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    /// Set severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set component
    #[inline]
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Whether the reporter gave an expected/actual contrast
    #[inline]
    #[must_use]
    pub fn has_contrast(&self) -> bool {
        self.expected_behavior.is_some() || self.actual_behavior.is_some()
    }

    /// Whether this item came out of a split
    #[inline]
    #[must_use]
    pub fn is_split_child(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Labels the item would carry on a tracker: kind, then component
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        let mut labels = vec![self.kind.label().to_string()];
        if let Some(component) = &self.component {
            labels.push(component.clone());
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::default(), Severity::Medium);
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("Feature Request".parse::<Kind>(), Ok(Kind::Feature));
        assert_eq!("improvement".parse::<Kind>(), Ok(Kind::Enhancement));
        assert!("question".parse::<Kind>().is_err());
    }

    #[test]
    fn kebab_case_serialization() {
        let item = FeedbackItem::new(ItemId::from_index(0), "Search is slow")
            .with_kind(Kind::Enhancement)
            .with_component("search");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "enhancement");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["needs-info"], true);
        assert_eq!(json["id"], "1");
        assert_eq!(item.labels(), vec!["enhancement", "search"]);
    }
}
