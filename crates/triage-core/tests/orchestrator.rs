//! Orchestrator behavior at the repository boundary and across submissions

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use triage_core::{
    Action, IssueDraft, IssueRepository, RepositoryError, Submission, TriageConfig, TriageError,
    TriageOrchestrator,
};
use triage_model::{IssueRecord, IssueState};
use triage_test_utils::{
    checkout_issue, corpus_with, init_tracing, login_issue_closed, snapshot_with, submission, t0,
    FailingRepository, InMemoryRepository, SlowRepository,
};

mock! {
    Repo {}

    #[async_trait]
    impl IssueRepository for Repo {
        async fn list(&self, state: IssueState) -> Result<Vec<IssueRecord>, RepositoryError>;
        async fn get(&self, number: u64) -> Result<Option<IssueRecord>, RepositoryError>;
        async fn create(&self, issue: IssueDraft) -> Result<u64, RepositoryError>;
        async fn comment(&self, number: u64, body: String) -> Result<(), RepositoryError>;
        async fn reopen(&self, number: u64) -> Result<(), RepositoryError>;
    }
}

fn orchestrator() -> TriageOrchestrator {
    init_tracing();
    TriageOrchestrator::new(TriageConfig::default()).unwrap()
}

#[tokio::test]
async fn fetches_open_and_closed_once_each() {
    let mut repo = MockRepo::new();
    repo.expect_list()
        .withf(|state| *state == IssueState::Open)
        .times(1)
        .returning(|_| Ok(vec![checkout_issue()]));
    repo.expect_list()
        .withf(|state| *state == IssueState::Closed)
        .times(1)
        .returning(|_| Ok(vec![login_issue_closed(10)]));
    repo.expect_create().never();
    repo.expect_comment().never();
    repo.expect_reopen().never();

    let report = orchestrator()
        .with_repository(Arc::new(repo))
        .triage(&submission("Submit button doesn't work on checkout"))
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].decision.action, Action::CommentOnOpen);
    assert_eq!(report.outcomes[0].decision.target_issue, Some(456));
}

#[tokio::test]
async fn invalid_input_rejected_before_fetch() {
    let mut repo = MockRepo::new();
    repo.expect_list().never();

    let err = orchestrator()
        .with_repository(Arc::new(repo))
        .triage(&Submission::new(" \t "))
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::InvalidInput(_)));
}

#[tokio::test]
async fn unavailable_repository_is_not_retried() {
    let mut repo = MockRepo::new();
    repo.expect_list()
        .times(1..=2)
        .returning(|_| Err(RepositoryError::Unreachable("connection refused".into())));

    let err = orchestrator()
        .with_repository(Arc::new(repo))
        .triage(&submission("Search results load slowly"))
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::RepositoryUnavailable(RepositoryError::Unreachable(_))));
    assert!(err.is_retryable());
    assert!(err.is_fatal());
}

#[tokio::test]
async fn failing_repository_surfaces_its_error() {
    let err = orchestrator()
        .with_repository(Arc::new(FailingRepository(RepositoryError::Rejected("forbidden".into()))))
        .triage(&submission("Search results load slowly"))
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::RepositoryUnavailable(RepositoryError::Rejected(_))));
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_times_out() {
    let repo = SlowRepository {
        delay: Duration::from_secs(60),
        inner: InMemoryRepository::new(corpus_with([checkout_issue()])),
    };
    let err = TriageOrchestrator::new(TriageConfig::default().with_fetch_timeout_ms(100))
        .unwrap()
        .with_repository(Arc::new(repo))
        .triage(&submission("Search results load slowly"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TriageError::RepositoryUnavailable(RepositoryError::Timeout { after_ms: 100 })
    ));
}

#[tokio::test]
async fn in_memory_fetch_matches_snapshot_pipeline() {
    let issues = corpus_with([checkout_issue(), login_issue_closed(10)]);
    let text = "Login still broken on mobile, started again yesterday";

    let fetched = orchestrator()
        .with_repository(Arc::new(InMemoryRepository::new(issues.clone())))
        .triage(&submission(text))
        .await
        .unwrap();
    let direct = orchestrator()
        .triage_with_snapshot(&submission(text), &snapshot_with([checkout_issue(), login_issue_closed(10)]))
        .unwrap();

    assert_eq!(
        serde_json::to_string(&fetched.outcomes).unwrap(),
        serde_json::to_string(&direct.outcomes).unwrap()
    );
    assert_eq!(fetched.outcomes[0].decision.action, Action::ReopenClosed);
}

#[tokio::test]
async fn fetched_triage_honors_query_deadline() {
    let issues = (1..=20).map(|n| IssueRecord::open(n, format!("Search filter variant {n}")));
    let mut config = TriageConfig::default();
    config.query_chunk_size = 5;

    let report = TriageOrchestrator::new(config)
        .unwrap()
        .with_repository(Arc::new(InMemoryRepository::new(issues)))
        .triage_until(
            &submission("Search filter ignores dates"),
            Some(std::time::Instant::now()),
        )
        .await
        .unwrap();

    let decision = &report.outcomes[0].decision;
    assert!(decision.has_flag(triage_core::DecisionFlag::TruncatedSearch));
    assert!(decision.rationale.iter().any(|r| r.contains("after 5 of 20")));
}

#[test]
fn report_carries_corpus_fingerprint() {
    let text = submission("Search results load slowly");
    let first = snapshot_with([checkout_issue(), login_issue_closed(10)]);
    let republished = first.apply(&triage_similarity::CorpusUpdate::new());
    let grown = snapshot_with([checkout_issue(), login_issue_closed(10), IssueRecord::open(9, "Dark mode")]);

    let a = orchestrator().triage_with_snapshot(&text, &first).unwrap();
    let b = orchestrator().triage_with_snapshot(&text, &republished).unwrap();
    let c = orchestrator().triage_with_snapshot(&text, &grown).unwrap();

    assert_ne!(a.snapshot_version, b.snapshot_version);
    assert_eq!(a.corpus_fingerprint, first.fingerprint());
    assert_eq!(a.corpus_fingerprint, b.corpus_fingerprint);
    assert_ne!(a.corpus_fingerprint, c.corpus_fingerprint);
}

#[test]
fn batch_keeps_input_order() {
    let snapshot = snapshot_with([checkout_issue(), login_issue_closed(10)]);
    let submissions = vec![
        submission("Submit button doesn't work on checkout"),
        Submission::new(""),
        submission("Login still broken on mobile, started again yesterday"),
        submission("Please add dark mode to the dashboard"),
    ];

    let results = orchestrator().triage_batch(&submissions, &snapshot);
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_ref().unwrap().outcomes[0].decision.action, Action::CommentOnOpen);
    assert!(matches!(results[1], Err(TriageError::InvalidInput(_))));
    assert_eq!(results[2].as_ref().unwrap().outcomes[0].decision.action, Action::ReopenClosed);
    assert_eq!(results[3].as_ref().unwrap().outcomes[0].decision.action, Action::CreateNew);
}

#[test]
fn expired_deadline_flags_truncated_search() {
    let issues = (1..=20).map(|n| IssueRecord::open(n, format!("Search filter variant {n}")));
    let snapshot = triage_similarity::CorpusSnapshot::from_issues(issues, t0());
    let mut config = TriageConfig::default();
    config.query_chunk_size = 5;

    let report = TriageOrchestrator::new(config)
        .unwrap()
        .triage_with_budget(
            &submission("Search filter ignores dates"),
            &snapshot,
            Some(std::time::Instant::now()),
        )
        .unwrap();

    let decision = &report.outcomes[0].decision;
    assert!(decision.has_flag(triage_core::DecisionFlag::TruncatedSearch));
    assert!(decision.rationale.iter().any(|r| r.contains("after 5 of 20")));
}

#[test]
fn config_file_drives_thresholds() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "reopen_window_days = 5\nscorer = \"tfidf-cosine\"")?;

    let config = TriageConfig::from_path(file.path())?;
    let report = TriageOrchestrator::new(config)?.triage_with_snapshot(
        &submission("Login still broken on mobile, started again yesterday"),
        &snapshot_with([login_issue_closed(10)]),
    )?;

    let decision = &report.outcomes[0].decision;
    assert_eq!(report.scorer, "tfidf-cosine");
    assert_eq!(decision.action, Action::CreateNew);
    assert_eq!(decision.related_issues, vec![123]);
    assert!(decision.rationale[0].contains("outside the 5-day window"));
    Ok(())
}

#[test]
fn fingerprint_tracks_text_and_config() {
    let snapshot = snapshot_with([]);
    let text = submission("Search results load slowly");
    let a = orchestrator().triage_with_snapshot(&text, &snapshot).unwrap();
    let b = orchestrator().triage_with_snapshot(&text, &snapshot).unwrap();
    let c = TriageOrchestrator::new(TriageConfig::default().with_high_threshold(0.9))
        .unwrap()
        .triage_with_snapshot(&text, &snapshot)
        .unwrap();

    assert_eq!(a.fingerprint, b.fingerprint);
    assert_ne!(a.fingerprint, c.fingerprint);
}

const FRAGMENTS: &[&str] = &[
    "Login is broken",
    "password reset doesn't work",
    "we need 2FA",
    "submit button doesn't work on checkout",
    "login still broken on mobile, started again yesterday",
    "search filter ignores dates for all users",
    "please add dark mode to settings",
    "the dashboard chart crashes again",
    "export to CSV is slow",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn decisions_well_formed_and_deterministic(
        parts in prop::collection::vec(prop::sample::select(FRAGMENTS), 1..5),
        separator in prop::sample::select(vec![". ", ", and ", "\n\n", ". Also, "]),
        closed_days in 0i64..500,
    ) {
        let text = parts.join(separator);
        let snapshot = snapshot_with([checkout_issue(), login_issue_closed(closed_days)]);

        for scorer in ["weighted-jaccard", "tfidf-cosine"] {
            let orchestrator = TriageOrchestrator::new(TriageConfig::default().with_scorer(scorer)).unwrap();
            let first = orchestrator.triage_with_snapshot(&submission(&text), &snapshot).unwrap();
            let second = orchestrator.triage_with_snapshot(&submission(&text), &snapshot).unwrap();

            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
            prop_assert!(!first.outcomes.is_empty());
            for outcome in &first.outcomes {
                prop_assert!(outcome.decision.is_well_formed(), "{:?}", outcome.decision);
                prop_assert!(outcome.item.split_depth <= orchestrator.config().max_split_depth);
            }
            prop_assert_eq!(first.summary.items, first.outcomes.len());
        }
    }
}
