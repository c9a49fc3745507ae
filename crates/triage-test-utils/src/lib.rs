//! Testing utilities for the triage workspace
//!
//! Shared fixtures, in-memory repositories and tracing setup.

#![allow(missing_docs)]

use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use triage_core::{IssueDraft, IssueRepository, RepositoryError, Submission};
use triage_model::{IssueRecord, IssueState};
use triage_similarity::CorpusSnapshot;

/// Fixed reference time for deterministic tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    t0() - chrono::Duration::days(days)
}

pub fn submission(text: &str) -> Submission {
    Submission::new(text).received_at(t0())
}

pub fn checkout_issue() -> IssueRecord {
    IssueRecord::open(456, "Checkout submit button unresponsive")
        .with_body("Clicking submit on the checkout page does nothing.")
        .with_label("bug")
        .with_created_at(days_ago(20))
}

pub fn login_issue_closed(days: i64) -> IssueRecord {
    IssueRecord::closed(123, "Login broken on mobile", days_ago(days))
        .with_label("bug")
        .with_created_at(days_ago(days + 30))
}

/// Unrelated issues so matches must win on content, not by being alone
pub fn background_issues() -> Vec<IssueRecord> {
    vec![
        IssueRecord::open(77, "Search filter ignores dates").with_label("bug"),
        IssueRecord::open(78, "Add dark mode to settings").with_label("feature"),
        IssueRecord::closed(79, "Export to CSV fails for large files", days_ago(90)),
    ]
}

pub fn corpus_with(issues: impl IntoIterator<Item = IssueRecord>) -> Vec<IssueRecord> {
    let mut corpus: Vec<IssueRecord> = issues.into_iter().collect();
    corpus.extend(background_issues());
    corpus
}

pub fn snapshot_with(issues: impl IntoIterator<Item = IssueRecord>) -> CorpusSnapshot {
    CorpusSnapshot::from_issues(corpus_with(issues), t0())
}

/// Repository serving a fixed corpus and recording writes
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    issues: Mutex<Vec<IssueRecord>>,
    comments: Mutex<Vec<(u64, String)>>,
}

impl InMemoryRepository {
    pub fn new(issues: impl IntoIterator<Item = IssueRecord>) -> Self {
        Self {
            issues: Mutex::new(issues.into_iter().collect()),
            comments: Mutex::new(Vec::new()),
        }
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().clone()
    }

    pub fn issue(&self, number: u64) -> Option<IssueRecord> {
        self.issues.lock().iter().find(|i| i.number == number).cloned()
    }
}

#[async_trait]
impl IssueRepository for InMemoryRepository {
    async fn list(&self, state: IssueState) -> Result<Vec<IssueRecord>, RepositoryError> {
        Ok(self
            .issues
            .lock()
            .iter()
            .filter(|i| i.state == state)
            .cloned()
            .collect())
    }

    async fn get(&self, number: u64) -> Result<Option<IssueRecord>, RepositoryError> {
        Ok(self.issue(number))
    }

    async fn create(&self, draft: IssueDraft) -> Result<u64, RepositoryError> {
        let mut issues = self.issues.lock();
        let number = issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
        let mut issue = IssueRecord::open(number, draft.title).with_body(draft.body);
        for label in draft.labels {
            issue = issue.with_label(label);
        }
        issues.push(issue);
        Ok(number)
    }

    async fn comment(&self, number: u64, body: String) -> Result<(), RepositoryError> {
        if self.issue(number).is_none() {
            return Err(RepositoryError::NotFound(number));
        }
        self.comments.lock().push((number, body));
        Ok(())
    }

    async fn reopen(&self, number: u64) -> Result<(), RepositoryError> {
        let mut issues = self.issues.lock();
        let issue = issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or(RepositoryError::NotFound(number))?;
        issue.state = IssueState::Open;
        issue.closed_at = None;
        Ok(())
    }
}

/// Repository whose every call fails with the same error
#[derive(Debug, Clone)]
pub struct FailingRepository(pub RepositoryError);

#[async_trait]
impl IssueRepository for FailingRepository {
    async fn list(&self, _state: IssueState) -> Result<Vec<IssueRecord>, RepositoryError> {
        Err(self.0.clone())
    }

    async fn get(&self, _number: u64) -> Result<Option<IssueRecord>, RepositoryError> {
        Err(self.0.clone())
    }

    async fn create(&self, _draft: IssueDraft) -> Result<u64, RepositoryError> {
        Err(self.0.clone())
    }

    async fn comment(&self, _number: u64, _body: String) -> Result<(), RepositoryError> {
        Err(self.0.clone())
    }

    async fn reopen(&self, _number: u64) -> Result<(), RepositoryError> {
        Err(self.0.clone())
    }
}

/// Repository that answers `list` only after a delay
#[derive(Debug)]
pub struct SlowRepository {
    pub delay: Duration,
    pub inner: InMemoryRepository,
}

#[async_trait]
impl IssueRepository for SlowRepository {
    async fn list(&self, state: IssueState) -> Result<Vec<IssueRecord>, RepositoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list(state).await
    }

    async fn get(&self, number: u64) -> Result<Option<IssueRecord>, RepositoryError> {
        self.inner.get(number).await
    }

    async fn create(&self, draft: IssueDraft) -> Result<u64, RepositoryError> {
        self.inner.create(draft).await
    }

    async fn comment(&self, number: u64, body: String) -> Result<(), RepositoryError> {
        self.inner.comment(number, body).await
    }

    async fn reopen(&self, number: u64) -> Result<(), RepositoryError> {
        self.inner.reopen(number).await
    }
}

/// Install a test subscriber once; honors `RUST_LOG`
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}
