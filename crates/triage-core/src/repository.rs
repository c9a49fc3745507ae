//! Issue repository boundary
//!
//! The only place triage performs I/O. The orchestrator reads the corpus with
//! [`IssueRepository::list`]; the write operations exist so callers can apply
//! decisions through the same interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use triage_model::{FeedbackItem, IssueRecord, IssueState};

use crate::error::RepositoryError;

/// Fields of an issue about to be filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IssueDraft {
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Labels
    pub labels: Vec<String>,
}

impl IssueDraft {
    /// Draft carrying an item's title, description and labels
    #[must_use]
    pub fn from_item(item: &FeedbackItem) -> Self {
        Self {
            title: item.title.clone(),
            body: item.description.clone(),
            labels: item.labels(),
        }
    }
}

/// Narrow interface to an issue tracker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// All issues in a state
    async fn list(&self, state: IssueState) -> Result<Vec<IssueRecord>, RepositoryError>;

    /// One issue, if it exists
    async fn get(&self, number: u64) -> Result<Option<IssueRecord>, RepositoryError>;

    /// File an issue, returning its number
    async fn create(&self, issue: IssueDraft) -> Result<u64, RepositoryError>;

    /// Comment on an issue
    async fn comment(&self, number: u64, body: String) -> Result<(), RepositoryError>;

    /// Reopen a closed issue
    async fn reopen(&self, number: u64) -> Result<(), RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_model::{ItemId, Kind};

    #[test]
    fn draft_from_item() {
        let item = FeedbackItem::new(ItemId::from_index(0), "Checkout button broken")
            .with_kind(Kind::Bug)
            .with_component("checkout");
        let draft = IssueDraft::from_item(&item);
        assert_eq!(draft.title, "Checkout button broken");
        assert_eq!(draft.labels, vec!["bug".to_string(), "checkout".to_string()]);
    }

    #[tokio::test]
    async fn mock_lists_by_state() {
        let mut repo = MockIssueRepository::new();
        repo.expect_list()
            .withf(|state| *state == IssueState::Open)
            .returning(|_| Ok(vec![IssueRecord::open(1, "Search is slow")]));

        let issues = repo.list(IssueState::Open).await.unwrap();
        assert_eq!(issues.len(), 1);
    }
}
