//! Feedback parser
//!
//! Turns raw text (or pre-structured JSON) into classified [`FeedbackItem`]s.

use serde::Deserialize;
use tracing::debug;
use triage_model::{text, FeedbackItem, ItemId, Kind, Severity};

use crate::error::ParseError;
use crate::extract;
use crate::rules::{self, Signals};
use crate::segment::segment;

/// Default minimum number of content tokens before an item is actionable
pub const DEFAULT_MIN_CONTENT_TOKENS: usize = 3;

/// Default title bound in characters
pub const DEFAULT_MAX_TITLE_CHARS: usize = 100;

/// Parser for free-text feedback
#[derive(Debug, Clone)]
pub struct FeedbackParser {
    min_content_tokens: usize,
    max_title_chars: usize,
}

impl Default for FeedbackParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackParser {
    /// Create parser with default thresholds
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_content_tokens: DEFAULT_MIN_CONTENT_TOKENS,
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
        }
    }

    /// With minimum content tokens
    #[inline]
    #[must_use]
    pub fn with_min_content_tokens(mut self, tokens: usize) -> Self {
        self.min_content_tokens = tokens;
        self
    }

    /// With title bound (at least 4 so the ellipsis fits)
    #[inline]
    #[must_use]
    pub fn with_max_title_chars(mut self, chars: usize) -> Self {
        self.max_title_chars = chars.max(4);
        self
    }

    /// Parse free text into items, in source order
    ///
    /// # Errors
    /// Returns [`ParseError::InvalidInput`] for blank text or text without words
    pub fn parse(&self, input: &str) -> Result<Vec<FeedbackItem>, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::invalid_input("feedback is empty"));
        }
        if text::words(input).is_empty() {
            return Err(ParseError::invalid_input("feedback contains no words"));
        }

        let items: Vec<FeedbackItem> = segment(input)
            .iter()
            .enumerate()
            .map(|(index, raw)| self.derive(ItemId::from_index(index), raw))
            .collect();

        debug!(items = items.len(), "parsed feedback");
        Ok(items)
    }

    /// Classify and extract one item from its text
    ///
    /// Used for top-level segments and again for every split child, so
    /// children are derived exactly like parents.
    #[must_use]
    pub fn derive(&self, id: ItemId, raw: &str) -> FeedbackItem {
        let signals = Signals::new(raw);
        let classification = rules::classify(&signals);
        let contrast = extract::contrast(raw);

        let mut item = FeedbackItem::new(id, raw);
        item.kind = classification.kind;
        item.classification_confidence = classification.confidence;
        item.severity = rules::severity(&signals);
        item.title = extract::title(raw, self.max_title_chars);
        item.description = raw.trim().to_string();
        item.steps_to_reproduce = extract::steps(raw);
        item.expected_behavior = contrast.expected;
        item.actual_behavior = contrast.actual;
        item.component = text::components_in(signals.tokens())
            .first()
            .map(|c| (*c).to_string());
        item.needs_info = self.needs_info(&item, signals.tokens().len());

        item
    }

    fn needs_info(&self, item: &FeedbackItem, content_tokens: usize) -> bool {
        item.classification_confidence <= 0.0
            || content_tokens < self.min_content_tokens
            || (item.kind == Kind::Bug && item.steps_to_reproduce.is_empty() && !item.has_contrast())
    }

    /// Parse pre-structured JSON feedback
    ///
    /// Accepts `{"items": [...]}`, a bare array, or a single entry. Entries are
    /// strings or objects with optional `title`, `type`, `severity`,
    /// `component`, `steps`, `expected` and `actual`; anything missing is
    /// inferred from the text with the same rule tables as [`Self::parse`].
    ///
    /// # Errors
    /// Returns error on malformed JSON, entries without text, or unknown
    /// kind/severity values
    pub fn parse_structured(&self, json: &str) -> Result<Vec<FeedbackItem>, ParseError> {
        let input: StructuredInput = serde_json::from_str(json)?;
        let entries = match input {
            StructuredInput::Batch { items } | StructuredInput::List(items) => items,
            StructuredInput::Single(entry) => vec![entry],
        };
        if entries.is_empty() {
            return Err(ParseError::invalid_input("structured feedback has no entries"));
        }

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| self.structured_item(index, entry))
            .collect()
    }

    fn structured_item(
        &self,
        index: usize,
        entry: StructuredEntry,
    ) -> Result<FeedbackItem, ParseError> {
        let fields = match entry {
            StructuredEntry::Text(text) => EntryFields {
                raw_text: Some(text),
                ..EntryFields::default()
            },
            StructuredEntry::Fields(fields) => fields,
        };

        let body = [&fields.raw_text, &fields.description, &fields.title]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .ok_or_else(|| ParseError::invalid_input(format!("entry {index} has no text")))?;

        let mut item = self.derive(ItemId::from_index(index), &body);

        if let Some(title) = fields.title.filter(|t| !t.trim().is_empty()) {
            item.title = text::truncate_chars(title.trim(), self.max_title_chars);
        }
        if let Some(description) = fields.description.filter(|d| !d.trim().is_empty()) {
            item.description = description.trim().to_string();
        }
        if let Some(kind) = fields.kind {
            item.kind = kind
                .parse::<Kind>()
                .map_err(|source| ParseError::UnknownValue { index, source })?;
            item.classification_confidence = 1.0;
        }
        if let Some(severity) = fields.severity {
            item.severity = severity
                .parse::<Severity>()
                .map_err(|source| ParseError::UnknownValue { index, source })?;
        }
        if let Some(component) = fields.component.filter(|c| !c.trim().is_empty()) {
            item.component = Some(component.trim().to_ascii_lowercase());
        }
        if !fields.steps.is_empty() {
            item.steps_to_reproduce = fields.steps;
        }
        if fields.expected.is_some() {
            item.expected_behavior = fields.expected;
        }
        if fields.actual.is_some() {
            item.actual_behavior = fields.actual;
        }

        item.needs_info = self.needs_info(&item, text::content_tokens(&body).len());
        Ok(item)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StructuredInput {
    Batch { items: Vec<StructuredEntry> },
    List(Vec<StructuredEntry>),
    Single(StructuredEntry),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StructuredEntry {
    Text(String),
    Fields(EntryFields),
}

#[derive(Debug, Default, Deserialize)]
struct EntryFields {
    #[serde(default, alias = "raw-text", alias = "text")]
    raw_text: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "type")]
    kind: Option<String>,
    #[serde(default, alias = "priority")]
    severity: Option<String>,
    #[serde(default)]
    component: Option<String>,
    #[serde(default, alias = "steps_to_reproduce", alias = "steps-to-reproduce")]
    steps: Vec<String>,
    #[serde(default, alias = "expected_behavior", alias = "expected-behavior")]
    expected: Option<String>,
    #[serde(default, alias = "actual_behavior", alias = "actual-behavior")]
    actual: Option<String>,
}
