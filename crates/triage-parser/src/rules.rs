//! Classification rule tables
//!
//! Every heuristic the parser applies lives here as data: a pattern, what it
//! votes for, and how much the vote weighs. Patterns are matched as whole
//! normalized words against both the raw wording and the canonical content
//! tokens, so `doesn't work` votes through the canonical `broken`.

use triage_model::{text, Kind, Severity};

/// A weighted vote for a kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindRule {
    /// Phrase in normalized form
    pub pattern: &'static str,
    /// Kind the phrase votes for
    pub kind: Kind,
    /// Vote weight
    pub weight: f64,
}

const fn rule(pattern: &'static str, kind: Kind, weight: f64) -> KindRule {
    KindRule {
        pattern,
        kind,
        weight,
    }
}

/// Kind rule table
pub const KIND_RULES: &[KindRule] = &[
    rule("broken", Kind::Bug, 1.0),
    rule("crash", Kind::Bug, 1.0),
    rule("error", Kind::Bug, 1.0),
    rule("fail", Kind::Bug, 1.0),
    rule("bug", Kind::Bug, 1.0),
    rule("freeze", Kind::Bug, 1.0),
    rule("hang", Kind::Bug, 0.8),
    rule("wrong", Kind::Bug, 0.8),
    rule("incorrect", Kind::Bug, 0.8),
    rule("cannot", Kind::Bug, 0.8),
    rule("problem", Kind::Bug, 0.6),
    rule("issue", Kind::Bug, 0.4),
    rule("need", Kind::Feature, 1.0),
    rule("want", Kind::Feature, 1.0),
    rule("would like", Kind::Feature, 1.0),
    rule("please add", Kind::Feature, 1.0),
    rule("ability to", Kind::Feature, 1.0),
    rule("feature", Kind::Feature, 1.0),
    rule("add", Kind::Feature, 0.8),
    rule("request", Kind::Feature, 0.8),
    rule("wish", Kind::Feature, 0.8),
    rule("support for", Kind::Feature, 0.8),
    rule("allow", Kind::Feature, 0.8),
    rule("would be nice", Kind::Feature, 0.8),
    rule("option to", Kind::Feature, 0.6),
    rule("improve", Kind::Enhancement, 1.0),
    rule("enhance", Kind::Enhancement, 1.0),
    rule("optimize", Kind::Enhancement, 1.0),
    rule("better", Kind::Enhancement, 0.8),
    rule("faster", Kind::Enhancement, 0.8),
    rule("easier", Kind::Enhancement, 0.8),
    rule("slow", Kind::Enhancement, 0.6),
    rule("confusing", Kind::Enhancement, 0.6),
    rule("clunky", Kind::Enhancement, 0.6),
    rule("should", Kind::Enhancement, 0.5),
];

/// Escalation vocabulary per severity tier; the highest matched tier wins
pub const SEVERITY_RULES: &[(Severity, &[&str])] = &[
    (
        Severity::Critical,
        &[
            "outage",
            "is down",
            "went down",
            "site down",
            "server down",
            "data loss",
            "lost data",
            "lost all",
            "corrupted",
            "security",
            "vulnerability",
            "breach",
            "blocker",
            "blocking",
            "production",
        ],
    ),
    (
        Severity::High,
        &[
            "many users",
            "all users",
            "every user",
            "everyone",
            "nobody can",
            "major",
            "important",
            "asap",
            "urgent",
            "serious",
        ],
    ),
    (
        Severity::Low,
        &[
            "cosmetic",
            "typo",
            "minor",
            "alignment",
            "misaligned",
            "spacing",
            "occasionally",
            "rarely",
            "isolated",
            "nice to have",
        ],
    ),
];

/// Language indicating a previously fixed problem came back
pub const REGRESSION_MARKERS: &[&str] = &[
    "again",
    "still",
    "regression",
    "regressed",
    "came back",
    "is back",
    "returned",
    "reappeared",
    "same issue",
    "broke again",
];

/// Markers that introduce a new topic
pub const SHIFT_MARKERS: &[&str] = &[
    "also",
    "additionally",
    "another",
    "separately",
    "furthermore",
    "besides",
    "in addition",
    "plus",
];

/// Verbs that open a reproduction step
pub const IMPERATIVE_VERBS: &[&str] = &[
    "go to",
    "click",
    "open",
    "tap",
    "enter",
    "navigate",
    "select",
    "type",
    "press",
    "choose",
    "scroll",
    "log in",
    "sign in",
    "then",
];

/// Pronouns that make a sentence lean on the previous one for its subject
pub const DANGLING_SUBJECTS: &[&str] = &[
    "it", "this", "that", "they", "these", "those", "which", "he", "she", "there",
];

/// Normalized views of one text, for phrase matching
#[derive(Debug, Clone)]
pub struct Signals {
    raw: String,
    canonical: String,
    tokens: Vec<String>,
}

impl Signals {
    /// Normalize a text
    #[must_use]
    pub fn new(input: &str) -> Self {
        let tokens = text::content_tokens(input);
        Self {
            raw: text::padded(input),
            canonical: format!(" {} ", tokens.join(" ")),
            tokens,
        }
    }

    /// Whether the phrase appears in the raw wording or the canonical tokens
    #[must_use]
    pub fn matches(&self, phrase: &str) -> bool {
        text::has_phrase(&self.raw, phrase) || text::has_phrase(&self.canonical, phrase)
    }

    /// Whether the phrase appears in the raw wording
    #[must_use]
    pub fn matches_raw(&self, phrase: &str) -> bool {
        text::has_phrase(&self.raw, phrase)
    }

    /// Content tokens
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Count of distinct markers from `markers` present in the raw wording
    #[must_use]
    pub fn count_raw(&self, markers: &[&str]) -> usize {
        markers.iter().filter(|m| self.matches_raw(m)).count()
    }
}

/// Result of running the kind rule table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Winning kind (bug when nothing matched)
    pub kind: Kind,
    /// Winning share of the total matched weight
    pub confidence: f64,
    /// Total matched weight
    pub total_weight: f64,
}

impl Classification {
    /// Nothing in the rule table matched
    #[inline]
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.total_weight <= 0.0
    }
}

/// Apply the kind rule table; ties resolve in [`Kind::ALL`] order (bug first)
#[must_use]
pub fn classify(signals: &Signals) -> Classification {
    let mut totals = [0.0_f64; 3];

    for rule in KIND_RULES {
        if signals.matches(rule.pattern) {
            totals[kind_slot(rule.kind)] += rule.weight;
        }
    }

    let total_weight: f64 = totals.iter().sum();
    if total_weight <= 0.0 {
        return Classification {
            kind: Kind::Bug,
            confidence: 0.0,
            total_weight: 0.0,
        };
    }

    let mut winner = Kind::Bug;
    for kind in Kind::ALL {
        if totals[kind_slot(kind)] > totals[kind_slot(winner)] {
            winner = kind;
        }
    }

    Classification {
        kind: winner,
        confidence: (totals[kind_slot(winner)] / total_weight).clamp(0.0, 1.0),
        total_weight,
    }
}

const fn kind_slot(kind: Kind) -> usize {
    match kind {
        Kind::Bug => 0,
        Kind::Feature => 1,
        Kind::Enhancement => 2,
    }
}

/// Apply the severity table; medium when no tier matches
#[must_use]
pub fn severity(signals: &Signals) -> Severity {
    SEVERITY_RULES
        .iter()
        .filter(|(_, phrases)| phrases.iter().any(|p| signals.matches_raw(p)))
        .map(|(tier, _)| *tier)
        .max()
        .unwrap_or_default()
}

/// Whether any kind rule matches
#[must_use]
pub fn has_kind_signal(signals: &Signals) -> bool {
    KIND_RULES.iter().any(|rule| signals.matches(rule.pattern))
}

/// Whether a content token is itself a single-word kind pattern
#[must_use]
pub fn is_signal_token(token: &str) -> bool {
    KIND_RULES
        .iter()
        .any(|rule| !rule.pattern.contains(' ') && rule.pattern == token)
}

/// Whether the text uses regression language
#[must_use]
pub fn has_regression_language(input: &str) -> bool {
    let signals = Signals::new(input);
    REGRESSION_MARKERS.iter().any(|m| signals.matches_raw(m))
}

/// Whether the text opens with a topic-shift marker
#[must_use]
pub fn starts_with_shift_marker(input: &str) -> bool {
    let lead = text::padded(input);
    SHIFT_MARKERS
        .iter()
        .any(|marker| lead.starts_with(&format!(" {} ", text::words(marker).join(" "))))
}

/// Occurrences of shift markers anywhere in the text
#[must_use]
pub fn shift_marker_count(input: &str) -> usize {
    let hay = text::padded(input);
    SHIFT_MARKERS
        .iter()
        .map(|marker| hay.matches(&format!(" {} ", text::words(marker).join(" "))).count())
        .sum()
}
