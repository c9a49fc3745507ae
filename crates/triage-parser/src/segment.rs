//! Segmentation of raw feedback into candidate items
//!
//! Boundaries, strongest first:
//! - enumerations (`1.`, `1)`, `-`, `*`, `•`), unless introduced by a
//!   "Steps to reproduce" header, in which case they belong to the current item
//! - blank-line paragraphs
//! - sentences opening with a shift marker (*also*, *another*, ...) or
//!   introducing a component the current segment does not mention
//!
//! A sentence that leans on the previous one for its subject (`It crashes.`)
//! never opens a segment.

use once_cell::sync::Lazy;
use regex::Regex;
use triage_model::text;

use crate::extract;
use crate::rules::{DANGLING_SUBJECTS, SHIFT_MARKERS};

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("valid paragraph regex"));

/// Split feedback into candidate segments, in source order
#[must_use]
pub fn segment(input: &str) -> Vec<String> {
    let normalized = input.replace("\r\n", "\n");
    let mut builder = SegmentBuilder::default();
    let mut in_steps = false;

    for paragraph in PARAGRAPH_BREAK.split(&normalized) {
        let mut prose: Vec<&str> = Vec::new();
        let mut first_unit = true;
        let mut last_was_header = false;

        for line in paragraph.lines().map(str::trim).filter(|l| !l.is_empty()) {
            last_was_header = false;

            if extract::is_steps_header(line) || extract::is_behavior_marker(line) {
                builder.flush_prose(&mut prose, &mut first_unit);
                builder.append_line(line);
                in_steps = extract::is_steps_header(line) || in_steps;
                last_was_header = extract::is_steps_header(line);
                continue;
            }

            if let Some(item) = extract::enumerated_item(line) {
                builder.flush_prose(&mut prose, &mut first_unit);
                if in_steps {
                    builder.append_line(line);
                } else {
                    builder.start(item);
                    first_unit = false;
                }
                continue;
            }

            in_steps = false;
            prose.push(line);
        }

        builder.flush_prose(&mut prose, &mut first_unit);
        if !last_was_header {
            in_steps = false;
        }
    }

    builder.finish()
}

#[derive(Debug, Default)]
struct SegmentBuilder {
    segments: Vec<String>,
}

impl SegmentBuilder {
    fn start(&mut self, text: &str) {
        self.segments.push(text.to_string());
    }

    fn append_line(&mut self, line: &str) {
        match self.segments.last_mut() {
            Some(current) => {
                current.push('\n');
                current.push_str(line);
            }
            None => self.start(line),
        }
    }

    fn append_sentence(&mut self, sentence: &str) {
        match self.segments.last_mut() {
            Some(current) => {
                current.push(' ');
                current.push_str(sentence);
            }
            None => self.start(sentence),
        }
    }

    /// Emit pending prose lines; the first sentence of a paragraph opens a
    /// segment unless it has no subject of its own
    fn flush_prose(&mut self, prose: &mut Vec<&str>, first_unit: &mut bool) {
        if prose.is_empty() {
            return;
        }
        let joined = prose.join(" ");
        prose.clear();

        for (i, sentence) in extract::sentences(&joined).into_iter().enumerate() {
            let opens_paragraph = i == 0 && *first_unit;
            let standalone = has_own_subject(&sentence);

            let boundary = if opens_paragraph {
                standalone || self.segments.is_empty()
            } else {
                standalone
                    && (crate::rules::starts_with_shift_marker(&sentence)
                        || self.introduces_component(&sentence))
            };

            if boundary {
                self.start(&sentence);
            } else {
                self.append_sentence(&sentence);
            }
        }
        *first_unit = false;
    }

    fn introduces_component(&self, sentence: &str) -> bool {
        let Some(current) = self.segments.last() else {
            return false;
        };
        let existing = text::components_in(&text::content_tokens(current));
        let incoming = text::components_in(&text::content_tokens(sentence));

        !existing.is_empty()
            && !incoming.is_empty()
            && incoming.iter().all(|c| !existing.contains(c))
    }

    fn finish(self) -> Vec<String> {
        self.segments
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Whether a sentence names its own subject instead of leaning on the
/// previous one
#[must_use]
pub fn has_own_subject(sentence: &str) -> bool {
    let words = text::words(sentence);
    let mut rest: &[String] = &words;

    for marker in SHIFT_MARKERS {
        let marker_words = text::words(marker);
        if rest.len() >= marker_words.len() && rest[..marker_words.len()] == marker_words[..] {
            rest = &rest[marker_words.len()..];
            break;
        }
    }
    while let Some(first) = rest.first() {
        if matches!(first.as_str(), "and" | "but" | "so" | "then") {
            rest = &rest[1..];
        } else {
            break;
        }
    }

    match rest.first() {
        None => false,
        Some(first) if DANGLING_SUBJECTS.contains(&first.as_str()) => false,
        Some(_) => text::content_tokens(&rest.join(" ")).len() >= 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_sentence_is_one_segment() {
        assert_eq!(
            segment("Login button does not respond on mobile Safari"),
            vec!["Login button does not respond on mobile Safari"]
        );
    }

    #[test]
    fn numbered_and_bulleted_lists() {
        let input = "1. Login is broken on mobile\n2) Export to CSV fails\n- Dark mode please";
        assert_eq!(
            segment(input),
            vec![
                "Login is broken on mobile",
                "Export to CSV fails",
                "Dark mode please"
            ]
        );
    }

    #[test]
    fn steps_stay_with_their_item() {
        let input = "Checkout crashes on submit.\n\nSteps to reproduce:\n1. Go to cart\n2. Click pay\nExpected: order placed";
        let segments = segment(input);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].contains("\n1. Go to cart\n2. Click pay"));
        assert!(segments[0].ends_with("Expected: order placed"));
    }

    #[test]
    fn paragraphs_split() {
        let input = "The dashboard chart is empty.\n\nSearch results load slowly.";
        assert_eq!(segment(input).len(), 2);
    }

    #[test]
    fn dangling_paragraph_attaches() {
        let input = "The dashboard chart is empty.\n\nIt happens on every reload.";
        assert_eq!(
            segment(input),
            vec!["The dashboard chart is empty. It happens on every reload."]
        );
    }

    #[test]
    fn shift_marker_and_component_shift() {
        let input = "Login fails on Safari. It shows a spinner. Also, the dashboard chart is empty. The export button is greyed out.";
        assert_eq!(
            segment(input),
            vec![
                "Login fails on Safari. It shows a spinner.",
                "Also, the dashboard chart is empty.",
                "The export button is greyed out."
            ]
        );
    }

    #[test]
    fn subject_detection() {
        assert!(has_own_subject("Also, checkout crashes."));
        assert!(!has_own_subject("It crashes."));
        assert!(!has_own_subject("Also it hangs."));
        assert!(!has_own_subject("And slow."));
    }
}
