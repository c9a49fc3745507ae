//! Structured field extraction: steps, expected and actual behavior, titles

use once_cell::sync::Lazy;
use regex::Regex;
use triage_model::text;

use crate::rules::IMPERATIVE_VERBS;

static ENUMERATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+(.+?)\s*$").expect("valid enumeration regex")
});

static STEPS_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:steps?(?:\s+to\s+reproduce)?|to\s+reproduce|repro(?:duction)?(?:\s+steps)?)\s*:?\s*$")
        .expect("valid steps header regex")
});

static EXPECTED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*expected(?:\s+(?:behaviou?r|result))?\s*:\s*(.+?)\s*$")
        .expect("valid expected marker regex")
});

static ACTUAL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*actual(?:\s+(?:behaviou?r|result))?\s*:\s*(.+?)\s*$")
        .expect("valid actual marker regex")
});

static EXPECTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:should|supposed to|expected to|expect)\b").expect("valid expectation regex")
});

static CONTRAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*,?\s*\b(?:but|however|instead)\b\s*,?\s*").expect("valid contrast regex")
});

static INSTEAD_OF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\binstead of\b").expect("valid instead-of regex"));

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)|\n+").expect("valid sentence regex"));

static STEP_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[.;,]\s*|\s+(?:and\s+)?then\s+|\s+and\s+").expect("valid step split regex")
});

/// Expected/actual pair pulled out of a description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contrast {
    /// What should have happened
    pub expected: Option<String>,
    /// What happened instead
    pub actual: Option<String>,
}

/// Text of an enumerated line (`1.`, `2)`, `-`, `*`, `•`) without its marker
#[must_use]
pub fn enumerated_item(line: &str) -> Option<&str> {
    ENUMERATED
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether a line introduces reproduction steps
#[must_use]
pub fn is_steps_header(line: &str) -> bool {
    STEPS_HEADER.is_match(line)
}

/// Whether a line carries an explicit `Expected:` or `Actual:` marker
#[must_use]
pub fn is_behavior_marker(line: &str) -> bool {
    EXPECTED_MARKER.is_match(line) || ACTUAL_MARKER.is_match(line)
}

/// Split prose into trimmed, non-empty sentences
#[must_use]
pub fn sentences(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(input) {
        let piece = input[start..m.end()].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        start = m.end();
    }
    let tail = input[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }

    out
}

/// Reproduction steps
///
/// Enumerated lines win; otherwise two or more consecutive imperative clauses
/// (`go to...`, `click...`, `then...`) count as steps.
#[must_use]
pub fn steps(input: &str) -> Vec<String> {
    let enumerated: Vec<String> = input
        .lines()
        .filter_map(enumerated_item)
        .map(str::to_string)
        .collect();
    if !enumerated.is_empty() {
        return enumerated;
    }

    let clauses: Vec<&str> = STEP_SPLIT
        .split(input)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    let mut best: Vec<String> = Vec::new();
    let mut run: Vec<String> = Vec::new();
    for clause in clauses {
        if starts_imperative(clause) {
            run.push(clause.to_string());
        } else {
            if run.len() > best.len() {
                best = std::mem::take(&mut run);
            }
            run.clear();
        }
    }
    if run.len() > best.len() {
        best = run;
    }

    if best.len() >= 2 {
        best
    } else {
        Vec::new()
    }
}

fn starts_imperative(clause: &str) -> bool {
    let lead = text::padded(clause);
    IMPERATIVE_VERBS
        .iter()
        .any(|verb| lead.starts_with(&format!(" {} ", text::words(verb).join(" "))))
}

/// Expected and actual behavior
///
/// Explicit `Expected:`/`Actual:` lines take precedence. Otherwise a sentence
/// with a contrast marker (`but`, `however`, `instead`) is split around it: an
/// expectation (`should`, `supposed to`) on the left becomes the expected
/// behavior and the right side the actual one.
#[must_use]
pub fn contrast(input: &str) -> Contrast {
    let mut result = Contrast {
        expected: capture(&EXPECTED_MARKER, input),
        actual: capture(&ACTUAL_MARKER, input),
    };
    if result.expected.is_some() || result.actual.is_some() {
        return result;
    }

    let all = sentences(input);
    for sentence in &all {
        if let Some(m) = INSTEAD_OF.find(sentence) {
            let actual = clean(&sentence[..m.start()]);
            let expected = clean(&sentence[m.end()..]);
            if !actual.is_empty() && !expected.is_empty() {
                result.actual = Some(actual);
                result.expected = Some(expected);
                return result;
            }
        }

        if let Some(m) = CONTRAST.find(sentence) {
            let left = clean(&sentence[..m.start()]);
            let right = clean(&sentence[m.end()..]);
            if right.is_empty() {
                continue;
            }
            if EXPECTATION.is_match(&left) {
                result.expected = Some(left);
                result.actual = Some(right);
                return result;
            }
            if let Some(expectation) = all.iter().find(|s| EXPECTATION.is_match(s)) {
                result.expected = Some(clean(expectation));
                result.actual = Some(right);
                return result;
            }
        }
    }

    result
}

fn capture(re: &Regex, input: &str) -> Option<String> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

fn clean(fragment: &str) -> String {
    fragment
        .trim()
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_string()
}

/// Title: first line or sentence, trimmed, capitalized and bounded
#[must_use]
pub fn title(input: &str, max_chars: usize) -> String {
    let first_line = input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    let first = sentences(first_line).into_iter().next().unwrap_or_default();
    let first = first.trim_end_matches(['.', '!', '?']).trim();

    text::truncate_chars(&capitalize(first), max_chars)
}

/// Uppercase the first character
#[must_use]
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
