//! Text normalization shared by parsing and similarity scoring
//!
//! Everything downstream of the raw feedback sees text through these helpers,
//! so the parser and the scorers agree on what a "token" is:
//!
//! 1. [`words`] lowercases, folds contractions (`doesn't` → `doesnt`) and splits
//!    on anything that is not alphanumeric.
//! 2. [`content_tokens`] collapses known phrases to a canonical term
//!    (`does not respond` → `broken`, `sign in` → `login`), drops stop words
//!    and applies a light suffix stemmer.
//!
//! Component detection works on content tokens so that `settings`,
//! `Settings` and `setting` land on the same component.

use std::collections::BTreeSet;

/// Phrases collapsed to a canonical term before stemming.
///
/// Patterns are written as normalized words (see [`words`]).
const CANONICAL_PHRASES: &[(&str, &str)] = &[
    ("does not work", "broken"),
    ("doesnt work", "broken"),
    ("do not work", "broken"),
    ("dont work", "broken"),
    ("not working", "broken"),
    ("stopped working", "broken"),
    ("does not respond", "broken"),
    ("doesnt respond", "broken"),
    ("not responding", "broken"),
    ("non responsive", "broken"),
    ("unresponsive", "broken"),
    ("does nothing", "broken"),
    ("broke", "broken"),
    ("sign in", "login"),
    ("signin", "login"),
    ("log in", "login"),
    ("logging in", "login"),
    ("logon", "login"),
    ("sign out", "logout"),
    ("log out", "logout"),
    ("sign up", "signup"),
    ("two factor", "2fa"),
    ("multi factor", "2fa"),
    ("mfa", "2fa"),
    ("e mail", "email"),
    ("can not", "cannot"),
    ("cant", "cannot"),
    ("unable to", "cannot"),
];

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "always", "am", "an", "and", "any",
    "anymore", "are", "arent", "as", "at", "be", "been", "before", "being", "but", "by",
    "can", "could", "did", "didnt", "do", "does", "doesnt", "doing", "dont", "each",
    "etc", "ever", "every", "for", "from", "get", "got", "had", "has", "have", "having",
    "he", "hello", "here", "hey", "hi", "how", "i", "if", "im", "in", "into", "is",
    "isnt", "it", "its", "ive", "just", "like", "may", "me", "might", "more", "most",
    "much", "must", "my", "no", "not", "now", "of", "ok", "okay", "on", "once", "one",
    "only", "onto", "or", "other", "our", "out", "over", "please", "plus", "really", "seem",
    "seems", "shall", "she", "should", "so", "some", "sometimes", "still", "than",
    "thank", "thanks", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "to", "today", "tomorrow", "too", "up", "us", "very", "was",
    "wasnt", "we", "were", "werent", "what", "when", "where", "which", "while", "who",
    "why", "will", "with", "wont", "would", "yes", "yesterday", "you", "your",
];

/// Component lexicon: component name and the content tokens that indicate it
pub const COMPONENTS: &[(&str, &[&str])] = &[
    (
        "authentication",
        &["login", "logout", "signup", "2fa", "sso", "auth", "authentication", "oauth"],
    ),
    ("account", &["password", "account", "profile", "avatar", "username"]),
    ("checkout", &["checkout", "cart", "payment", "billing", "invoice"]),
    ("search", &["search", "filter"]),
    ("notifications", &["notification", "email", "alert"]),
    ("dashboard", &["dashboard", "chart", "analytic", "widget", "graph"]),
    ("settings", &["setting", "preference", "configuration"]),
    ("uploads", &["upload", "attachment", "download"]),
    ("api", &["api", "webhook", "endpoint", "integration"]),
    ("messaging", &["message", "chat", "inbox", "conversation"]),
    ("export", &["export", "import", "csv"]),
];

/// Split text into normalized words
///
/// Lowercases, drops apostrophes inside words (`doesn't` → `doesnt`) and
/// treats every other non-alphanumeric character as a separator.
#[must_use]
pub fn words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if matches!(ch, '\'' | '\u{2019}') && !current.is_empty() {
            continue;
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }

    out
}

/// Space-padded normalized form used for whole-phrase matching
#[must_use]
pub fn padded(text: &str) -> String {
    format!(" {} ", words(text).join(" "))
}

/// Check whether `haystack` (from [`padded`]) contains `phrase` as whole words
#[must_use]
pub fn has_phrase(haystack: &str, phrase: &str) -> bool {
    let needle = words(phrase).join(" ");
    if needle.is_empty() {
        return false;
    }
    haystack.contains(&format!(" {needle} "))
}

/// Check if a normalized word is a stop word
#[inline]
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Light suffix stemmer
///
/// Only strips plural and `-ing`/`-ed` endings when a stem of at least four
/// characters remains, which keeps short words like `need` or `speed` intact.
#[must_use]
pub fn stem(word: &str) -> String {
    if word.len() <= 3 || !word.is_ascii() {
        return word.to_string();
    }

    if let Some(base) = word.strip_suffix("ies") {
        if base.len() >= 2 {
            return format!("{base}y");
        }
    }
    for suffix in ["ches", "shes", "sses", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if let Some(base) = word.strip_suffix("ing") {
        if base.len() >= 4 {
            return base.to_string();
        }
    }
    if let Some(base) = word.strip_suffix("ed") {
        if base.len() >= 4 {
            return base.to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

/// Longest canonical phrase starting at `start`, as (word count, canonical term)
fn canonical_at(words: &[String], start: usize) -> Option<(usize, &'static str)> {
    let mut best: Option<(usize, &'static str)> = None;

    for (phrase, canonical) in CANONICAL_PHRASES {
        let parts: Vec<&str> = phrase.split(' ').collect();
        let end = start + parts.len();
        if end > words.len() {
            continue;
        }
        let matches = words[start..end]
            .iter()
            .zip(&parts)
            .all(|(w, p)| w == p);
        if matches && best.map_or(true, |(len, _)| parts.len() > len) {
            best = Some((parts.len(), *canonical));
        }
    }

    best
}

/// Content tokens of a text, in order, duplicates kept
#[must_use]
pub fn content_tokens(text: &str) -> Vec<String> {
    let raw = words(text);
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if let Some((len, canonical)) = canonical_at(&raw, i) {
            out.push(canonical.to_string());
            i += len;
            continue;
        }

        let word = &raw[i];
        i += 1;
        if is_stop_word(word) {
            continue;
        }
        out.push(stem(word));
    }

    out
}

/// Distinct content tokens
#[must_use]
pub fn token_set(text: &str) -> BTreeSet<String> {
    content_tokens(text).into_iter().collect()
}

/// Jaccard similarity of two token sets; 0.0 when both are empty
#[must_use]
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / union as f64
}

/// Distinct components mentioned by the given content tokens, first-seen order
#[must_use]
pub fn components_in<S: AsRef<str>>(tokens: &[S]) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        for (component, keywords) in COMPONENTS {
            if keywords.contains(&token) && !found.contains(component) {
                found.push(*component);
            }
        }
    }

    found
}

/// First component mentioned by a text
#[must_use]
pub fn primary_component(text: &str) -> Option<&'static str> {
    components_in(&content_tokens(text)).into_iter().next()
}

/// Truncate to at most `max_chars` characters, ending with `...` when cut
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    out
}
