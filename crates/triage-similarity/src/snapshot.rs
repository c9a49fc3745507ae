//! Immutable, versioned corpus snapshots
//!
//! A [`CorpusSnapshot`] is a pre-tokenized point-in-time view of the issue
//! corpus. Snapshots are values: [`CorpusSnapshot::apply`] returns a new
//! snapshot that shares structure with the old one (persistent `im` maps), so
//! an update only tokenizes the issues it touches and readers holding the old
//! snapshot are unaffected.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use triage_model::{text, Fingerprint, IssueRecord};

/// An issue with its tokenized fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedIssue {
    /// Source record
    pub issue: IssueRecord,
    /// Title content tokens, in order
    pub title_tokens: Vec<String>,
    /// Body content tokens, in order
    pub body_tokens: Vec<String>,
    /// Distinct title tokens
    pub title_set: BTreeSet<String>,
    /// Distinct title and body tokens
    pub full_set: BTreeSet<String>,
    /// Explicit or title-derived component
    pub component: Option<String>,
    /// Lowercased labels
    pub labels: BTreeSet<String>,
}

impl IndexedIssue {
    /// Tokenize an issue
    #[must_use]
    pub fn new(issue: IssueRecord) -> Self {
        let title_tokens = text::content_tokens(&issue.title);
        let body_tokens = text::content_tokens(&issue.body);
        let title_set: BTreeSet<String> = title_tokens.iter().cloned().collect();
        let full_set: BTreeSet<String> = title_tokens
            .iter()
            .chain(body_tokens.iter())
            .cloned()
            .collect();
        let labels = issue
            .labels
            .iter()
            .map(|l| l.trim().to_ascii_lowercase())
            .collect();

        Self {
            component: issue.effective_component(),
            issue,
            title_tokens,
            body_tokens,
            title_set,
            full_set,
            labels,
        }
    }

    /// Issue number
    #[inline]
    #[must_use]
    pub fn number(&self) -> u64 {
        self.issue.number
    }
}

/// Batch of corpus changes
#[derive(Debug, Clone, Default)]
pub struct CorpusUpdate {
    upserts: Vec<IssueRecord>,
    removals: Vec<u64>,
    as_of: Option<DateTime<Utc>>,
}

impl CorpusUpdate {
    /// Empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an issue
    #[inline]
    #[must_use]
    pub fn upsert(mut self, issue: IssueRecord) -> Self {
        self.upserts.push(issue);
        self
    }

    /// Insert or replace several issues
    #[must_use]
    pub fn upsert_all(mut self, issues: impl IntoIterator<Item = IssueRecord>) -> Self {
        self.upserts.extend(issues);
        self
    }

    /// Remove an issue
    #[inline]
    #[must_use]
    pub fn remove(mut self, number: u64) -> Self {
        self.removals.push(number);
        self
    }

    /// Move the snapshot reference time
    #[inline]
    #[must_use]
    pub fn at(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Check if the update changes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty() && self.as_of.is_none()
    }
}

/// Immutable, versioned view of the issue corpus
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    version: u64,
    as_of: DateTime<Utc>,
    issues: im::OrdMap<u64, Arc<IndexedIssue>>,
    doc_freq: im::HashMap<String, usize>,
}

impl CorpusSnapshot {
    /// Empty snapshot at version 0
    #[must_use]
    pub fn empty(as_of: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            as_of,
            issues: im::OrdMap::new(),
            doc_freq: im::HashMap::new(),
        }
    }

    /// Snapshot holding `issues` (version 1)
    #[must_use]
    pub fn from_issues(issues: impl IntoIterator<Item = IssueRecord>, as_of: DateTime<Utc>) -> Self {
        Self::empty(as_of).apply(&CorpusUpdate::new().upsert_all(issues))
    }

    /// New snapshot with `update` applied; `self` is left untouched
    ///
    /// Removals are applied before upserts. Only touched issues are
    /// re-tokenized and only their tokens' document frequencies change.
    #[must_use]
    pub fn apply(&self, update: &CorpusUpdate) -> Self {
        let mut next = self.clone();
        next.version = self.version + 1;
        if let Some(as_of) = update.as_of {
            next.as_of = as_of;
        }

        for number in &update.removals {
            if let Some(old) = next.issues.remove(number) {
                next.forget_tokens(&old);
            }
        }
        for issue in &update.upserts {
            let indexed = Arc::new(IndexedIssue::new(issue.clone()));
            if let Some(old) = next.issues.insert(issue.number, Arc::clone(&indexed)) {
                next.forget_tokens(&old);
            }
            next.count_tokens(&indexed);
        }

        next
    }

    /// Same corpus and version, evaluated at another reference time
    #[must_use]
    pub fn at(&self, as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            ..self.clone()
        }
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    fn count_tokens(&mut self, issue: &IndexedIssue) {
        for token in &issue.full_set {
            *self.doc_freq.entry(token.clone()).or_insert(0) += 1;
        }
    }

    fn forget_tokens(&mut self, issue: &IndexedIssue) {
        for token in &issue.full_set {
            let remaining = self.doc_freq.get(token).map_or(0, |n| n.saturating_sub(1));
            if remaining == 0 {
                self.doc_freq.remove(token);
            } else {
                self.doc_freq.insert(token.clone(), remaining);
            }
        }
    }

    /// Version, bumped on every [`Self::apply`]; a [`SnapshotStore`](crate::SnapshotStore) only ever publishes increasing versions
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Reference time for decay and reopen windows
    #[inline]
    #[must_use]
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// Number of issues
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Check if the corpus is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Look up an indexed issue
    #[inline]
    #[must_use]
    pub fn get(&self, number: u64) -> Option<&Arc<IndexedIssue>> {
        self.issues.get(&number)
    }

    /// Look up an issue record
    #[inline]
    #[must_use]
    pub fn issue(&self, number: u64) -> Option<&IssueRecord> {
        self.issues.get(&number).map(|i| &i.issue)
    }

    /// Issues in ascending number order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<IndexedIssue>> {
        self.issues.values()
    }

    /// Number of issues whose title or body contains `token`
    #[inline]
    #[must_use]
    pub fn doc_freq(&self, token: &str) -> usize {
        self.doc_freq.get(token).copied().unwrap_or(0)
    }

    /// Content fingerprint over all issue records, in number order
    ///
    /// Independent of version and reference time: two snapshots with the same
    /// issues have the same fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let encoded: Vec<Vec<u8>> = self
            .issues
            .values()
            .map(|i| serde_json::to_vec(&i.issue).unwrap_or_default())
            .collect();
        Fingerprint::compute_parts(encoded.iter().map(Vec::as_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn corpus() -> CorpusSnapshot {
        CorpusSnapshot::from_issues(
            vec![
                IssueRecord::open(456, "Checkout submit button unresponsive")
                    .with_body("Clicking submit on the checkout page does nothing."),
                IssueRecord::closed(123, "Login broken on mobile", t0()),
            ],
            t0(),
        )
    }

    #[test]
    fn builds_tokens_and_frequencies() {
        let snapshot = corpus();
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.doc_freq("broken"), 2);
        assert_eq!(snapshot.doc_freq("checkout"), 1);
        assert_eq!(snapshot.doc_freq("missing"), 0);

        let checkout = snapshot.get(456).unwrap();
        assert_eq!(checkout.component.as_deref(), Some("checkout"));
        assert!(checkout.full_set.contains("page"));
        assert!(!checkout.title_set.contains("page"));
    }

    #[test]
    fn apply_is_persistent() {
        let before = corpus();
        let after = before.apply(
            &CorpusUpdate::new()
                .remove(123)
                .upsert(IssueRecord::open(789, "Search filter broken")),
        );

        assert_eq!(before.version(), 1);
        assert_eq!(after.version(), 2);
        assert!(before.get(123).is_some());
        assert!(after.get(123).is_none());
        assert!(after.get(789).is_some());
        assert_eq!(before.doc_freq("login"), 1);
        assert_eq!(after.doc_freq("login"), 0);
        assert_eq!(after.doc_freq("broken"), 2);
        assert!(Arc::ptr_eq(before.get(456).unwrap(), after.get(456).unwrap()));
    }

    #[test]
    fn upsert_replaces_frequencies() {
        let after = corpus().apply(
            &CorpusUpdate::new().upsert(IssueRecord::open(456, "Cart total is wrong")),
        );
        assert_eq!(after.len(), 2);
        assert_eq!(after.doc_freq("checkout"), 0);
        assert_eq!(after.doc_freq("cart"), 1);
    }

    #[test]
    fn fingerprint_ignores_version_and_time() {
        let snapshot = corpus();
        let bumped = snapshot.apply(&CorpusUpdate::new()).at(t0() + chrono::Duration::days(3));
        assert_ne!(snapshot.version(), bumped.version());
        assert_eq!(snapshot.fingerprint(), bumped.fingerprint());

        let changed = snapshot.apply(&CorpusUpdate::new().remove(456));
        assert_ne!(snapshot.fingerprint(), changed.fingerprint());
    }
}
