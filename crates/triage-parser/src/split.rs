//! Complexity analysis
//!
//! Detects items that bundle several problems or requests and splits them into
//! atomic children. Splitting runs over an explicit worklist where every entry
//! carries its own depth, so the depth bound is checked per item rather than
//! relied on through a recursion limit.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use triage_model::{text, FeedbackItem};

use crate::error::ParseWarning;
use crate::extract;
use crate::parser::FeedbackParser;
use crate::rules::{self, Signals};

/// Default maximum number of nested splits
pub const DEFAULT_MAX_SPLIT_DEPTH: u32 = 2;

/// Default token count at or below which an item is never split
pub const DEFAULT_MIN_ATOMIC_TOKENS: usize = 3;

/// Default token count above which shift markers alone trigger a split
pub const DEFAULT_LONG_ITEM_TOKENS: usize = 40;

static CLAUSE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*[,;]\s*(?:(?:but\s+also|and|but|also|plus)\s+)?|\s+(?:and|but\s+also|also|plus)\s+|[.!?]+(?:\s+|$)|\s*\n+\s*",
    )
    .expect("valid clause separator regex")
});

/// Why an item was considered non-atomic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitTrigger {
    /// Two or more distinct components are mentioned
    MultipleComponents,
    /// Two or more independent action/subject clauses
    MultipleActions,
    /// Long item with repeated topic-shift markers
    LongWithShifts,
}

/// Result of analyzing one or more items
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    /// Items that flow downstream, in source order
    pub atomic: Vec<FeedbackItem>,
    /// Items replaced by their children (audit only)
    pub replaced: Vec<FeedbackItem>,
    /// Non-fatal conditions raised while splitting
    pub warnings: Vec<ParseWarning>,
}

impl SplitOutcome {
    fn merge(&mut self, other: Self) {
        self.atomic.extend(other.atomic);
        self.replaced.extend(other.replaced);
        self.warnings.extend(other.warnings);
    }
}

/// Splits non-atomic feedback items
#[derive(Debug, Clone)]
pub struct ComplexityAnalyzer {
    parser: FeedbackParser,
    max_depth: u32,
    min_atomic_tokens: usize,
    long_item_tokens: usize,
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new(FeedbackParser::new())
    }
}

impl ComplexityAnalyzer {
    /// Create analyzer; children are re-derived with `parser`
    #[inline]
    #[must_use]
    pub fn new(parser: FeedbackParser) -> Self {
        Self {
            parser,
            max_depth: DEFAULT_MAX_SPLIT_DEPTH,
            min_atomic_tokens: DEFAULT_MIN_ATOMIC_TOKENS,
            long_item_tokens: DEFAULT_LONG_ITEM_TOKENS,
        }
    }

    /// With max split depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// With minimum divisible size
    #[inline]
    #[must_use]
    pub fn with_min_atomic_tokens(mut self, tokens: usize) -> Self {
        self.min_atomic_tokens = tokens;
        self
    }

    /// With long-item threshold
    #[inline]
    #[must_use]
    pub fn with_long_item_tokens(mut self, tokens: usize) -> Self {
        self.long_item_tokens = tokens;
        self
    }

    /// Max split depth
    #[inline]
    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Split triggers that fire for an item
    #[must_use]
    pub fn triggers(&self, item: &FeedbackItem) -> Vec<SplitTrigger> {
        let tokens = text::content_tokens(&item.raw_text);
        if tokens.len() <= self.min_atomic_tokens {
            return Vec::new();
        }

        let mut fired = Vec::new();
        if text::components_in(&tokens).len() >= 2 {
            fired.push(SplitTrigger::MultipleComponents);
        }
        let (head, _) = split_structured_tail(&item.raw_text);
        let actionable = clauses(head)
            .iter()
            .filter(|(start, end)| is_actionable(&head[*start..*end]))
            .count();
        if actionable >= 2 {
            fired.push(SplitTrigger::MultipleActions);
        }
        if tokens.len() > self.long_item_tokens && rules::shift_marker_count(&item.raw_text) >= 2 {
            fired.push(SplitTrigger::LongWithShifts);
        }

        fired
    }

    /// Analyze one item, splitting it into atomic children where needed
    #[must_use]
    pub fn analyze(&self, item: FeedbackItem) -> SplitOutcome {
        let mut outcome = SplitOutcome::default();
        let mut worklist = vec![item];

        while let Some(mut current) = worklist.pop() {
            let depth = current.split_depth;
            let triggers = self.triggers(&current);
            if triggers.is_empty() {
                outcome.atomic.push(current);
                continue;
            }

            let groups = clause_groups(&current.raw_text);
            if groups.len() < 2 {
                outcome.atomic.push(current);
                continue;
            }

            if depth >= self.max_depth {
                warn!(item = %current.id, depth, "split depth reached, keeping item oversized");
                current.oversized = true;
                outcome.warnings.push(ParseWarning::SplitDepthExceeded {
                    item: current.id.clone(),
                    depth,
                });
                outcome.atomic.push(current);
                continue;
            }

            debug!(
                item = %current.id,
                depth,
                children = groups.len(),
                ?triggers,
                "splitting item"
            );

            let children: Vec<FeedbackItem> = groups
                .iter()
                .enumerate()
                .map(|(index, group)| {
                    let mut child = self.parser.derive(current.id.child(index), group);
                    child.parent_id = Some(current.id.clone());
                    child.split_depth = depth + 1;
                    child
                })
                .collect();

            outcome.replaced.push(current);
            // Reversed so the worklist pops children in source order
            worklist.extend(children.into_iter().rev());
        }

        outcome
    }

    /// Analyze items in order
    #[must_use]
    pub fn analyze_all(&self, items: Vec<FeedbackItem>) -> SplitOutcome {
        let mut outcome = SplitOutcome::default();
        for item in items {
            outcome.merge(self.analyze(item));
        }
        outcome
    }
}

/// Separate prose from a trailing structured block (steps, expected/actual)
fn split_structured_tail(input: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if extract::is_steps_header(line.trim()) || extract::is_behavior_marker(line.trim()) {
            return (&input[..offset], &input[offset..]);
        }
        offset += line.len();
    }
    (input, "")
}

/// Clause byte spans between separators
fn clauses(input: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;

    for sep in CLAUSE_SEPARATOR.find_iter(input) {
        if sep.start() > start && !input[start..sep.start()].trim().is_empty() {
            spans.push((start, sep.start()));
        }
        start = sep.end();
    }
    if start < input.len() && !input[start..].trim().is_empty() {
        spans.push((start, input.len()));
    }

    spans
}

/// A clause that states a problem or request about its own subject
fn is_actionable(clause: &str) -> bool {
    let signals = Signals::new(clause);
    rules::has_kind_signal(&signals)
        && signals
            .tokens()
            .iter()
            .any(|token| !rules::is_signal_token(token))
}

/// Group clauses so each group holds exactly one actionable clause plus the
/// context around it; the structured tail stays with the last group
fn clause_groups(input: &str) -> Vec<String> {
    let (head, _) = split_structured_tail(input);
    let mut groups: Vec<(usize, usize)> = Vec::new();
    let mut leading: Option<usize> = None;

    for (start, end) in clauses(head) {
        if is_actionable(&head[start..end]) {
            let start = if groups.is_empty() {
                leading.take().unwrap_or(start)
            } else {
                start
            };
            groups.push((start, end));
        } else if let Some(last) = groups.last_mut() {
            last.1 = end;
        } else {
            leading.get_or_insert(start);
        }
    }

    if let Some(last) = groups.last_mut() {
        last.1 = input.len();
    }

    groups
        .into_iter()
        .map(|(start, end)| input[start..end].trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}
