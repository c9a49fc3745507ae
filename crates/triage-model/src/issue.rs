//! Existing tracker issues

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::Severity;
use crate::text;

/// Open or closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueState {
    /// Still open
    Open,
    /// Closed (fixed, won't fix, duplicate, ...)
    Closed,
}

/// Labels that mark a closed issue as intentionally not fixed
const WONT_FIX_LABELS: &[&str] = &[
    "wontfix",
    "won't fix",
    "wont fix",
    "won't-fix",
    "invalid",
    "duplicate",
    "not planned",
    "not-planned",
];

/// An issue in the external corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IssueRecord {
    /// Tracker issue number
    pub number: u64,
    /// Issue title
    pub title: String,
    /// Issue body
    #[serde(default)]
    pub body: String,
    /// Open or closed
    pub state: IssueState,
    /// Tracker labels
    #[serde(default)]
    pub labels: Vec<String>,
    /// When the issue was closed
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Product component, if known
    #[serde(default)]
    pub component: Option<String>,
    /// When the issue was opened
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last activity on the issue
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IssueRecord {
    /// An open issue
    #[must_use]
    pub fn open(number: u64, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: String::new(),
            state: IssueState::Open,
            labels: Vec::new(),
            closed_at: None,
            component: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// A closed issue
    #[must_use]
    pub fn closed(number: u64, title: impl Into<String>, closed_at: DateTime<Utc>) -> Self {
        Self {
            state: IssueState::Closed,
            closed_at: Some(closed_at),
            updated_at: Some(closed_at),
            ..Self::open(number, title)
        }
    }

    /// Set body
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Set component
    #[inline]
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Set creation time
    #[inline]
    #[must_use]
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Set last update time
    #[inline]
    #[must_use]
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Check if open
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    /// Component from the explicit field, then a `component-<name>` label,
    /// then the title; always trimmed and lowercased
    #[must_use]
    pub fn effective_component(&self) -> Option<String> {
        self.component
            .as_deref()
            .and_then(normalize_component)
            .or_else(|| self.labels.iter().find_map(|label| label_component(label)))
            .or_else(|| text::primary_component(&self.title).map(str::to_string))
    }

    /// Most recent known activity: update, close, then creation time
    #[must_use]
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.closed_at).or(self.created_at)
    }

    /// Days between closing and `as_of`, never negative
    #[must_use]
    pub fn days_since_closed(&self, as_of: DateTime<Utc>) -> Option<f64> {
        self.closed_at
            .map(|closed| (as_of - closed).num_seconds().max(0) as f64 / 86_400.0)
    }

    /// Severity encoded in labels (`priority-critical`, `severity:high`, `P1`, ...)
    ///
    /// The most urgent matching label wins.
    #[must_use]
    pub fn severity_from_labels(&self) -> Option<Severity> {
        self.labels
            .iter()
            .filter_map(|label| label_severity(label))
            .max()
    }

    /// Closed as won't fix, invalid or duplicate
    #[must_use]
    pub fn is_wont_fix(&self) -> bool {
        self.labels.iter().any(|label| {
            let label = label.trim().to_ascii_lowercase();
            WONT_FIX_LABELS.contains(&label.as_str())
        })
    }
}

/// Trimmed, lowercased component name; `None` when blank
#[must_use]
pub fn normalize_component(name: &str) -> Option<String> {
    let name = name.trim().to_lowercase();
    (!name.is_empty()).then_some(name)
}

fn label_component(label: &str) -> Option<String> {
    let label = label.trim().to_ascii_lowercase();
    let rest = label
        .strip_prefix("component")
        .and_then(|rest| rest.strip_prefix(['-', ':', '/']))?;
    normalize_component(rest)
}

fn label_severity(label: &str) -> Option<Severity> {
    let label = label.trim().to_ascii_lowercase();
    match label.as_str() {
        "p0" => return Some(Severity::Critical),
        "p1" => return Some(Severity::High),
        "p2" => return Some(Severity::Medium),
        "p3" => return Some(Severity::Low),
        _ => {}
    }

    let value = ["priority", "severity", "sev"].iter().find_map(|prefix| {
        label
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(['-', ':', '/', ' ']))
    })?;
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn severity_labels() {
        let issue = IssueRecord::open(1, "x")
            .with_label("bug")
            .with_label("severity:high")
            .with_label("priority-critical");
        assert_eq!(issue.severity_from_labels(), Some(Severity::Critical));
        assert_eq!(
            IssueRecord::open(2, "y").with_label("P3").severity_from_labels(),
            Some(Severity::Low)
        );
        assert_eq!(IssueRecord::open(3, "z").with_label("bug").severity_from_labels(), None);
    }

    #[test]
    fn wont_fix_labels() {
        let closed = IssueRecord::closed(1, "x", t0());
        assert!(!closed.is_wont_fix());
        assert!(closed.clone().with_label("Won't Fix").is_wont_fix());
        assert!(closed.with_label("duplicate").is_wont_fix());
    }

    #[test]
    fn days_since_closed_never_negative() {
        let issue = IssueRecord::closed(1, "x", t0());
        assert_eq!(issue.days_since_closed(t0() + Duration::days(10)), Some(10.0));
        assert_eq!(issue.days_since_closed(t0() - Duration::days(1)), Some(0.0));
        assert_eq!(IssueRecord::open(2, "y").days_since_closed(t0()), None);
    }

    #[test]
    fn component_falls_back_to_title() {
        assert_eq!(
            IssueRecord::open(456, "Checkout submit button unresponsive").effective_component(),
            Some("checkout".to_string())
        );
        assert_eq!(
            IssueRecord::open(1, "Login broken")
                .with_component("auth-service")
                .effective_component(),
            Some("auth-service".to_string())
        );
    }

    #[test]
    fn component_is_normalized() {
        assert_eq!(
            IssueRecord::open(1, "Submit button unresponsive")
                .with_component("  Checkout ")
                .effective_component(),
            Some("checkout".to_string())
        );
        assert_eq!(
            IssueRecord::open(2, "Submit button unresponsive")
                .with_label("bug")
                .with_label("Component-Checkout")
                .effective_component(),
            Some("checkout".to_string())
        );
        assert_eq!(
            IssueRecord::open(3, "Login broken")
                .with_component("   ")
                .effective_component(),
            Some("authentication".to_string())
        );
    }
}
