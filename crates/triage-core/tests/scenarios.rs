//! End-to-end triage scenarios, run once per built-in scorer

use pretty_assertions::assert_eq;
use triage_core::{Action, DecisionFlag, TriageConfig, TriageOrchestrator, TriageReport};
use triage_model::Kind;
use triage_similarity::{CorpusSnapshot, StrategyRegistry};
use triage_test_utils::{
    checkout_issue, init_tracing, login_issue_closed, snapshot_with, submission, t0,
};

fn scorers() -> Vec<&'static str> {
    StrategyRegistry::with_defaults().names()
}

fn run(scorer: &str, text: &str, snapshot: &CorpusSnapshot) -> TriageReport {
    init_tracing();
    TriageOrchestrator::new(TriageConfig::default().with_scorer(scorer))
        .unwrap()
        .triage_with_snapshot(&submission(text), snapshot)
        .unwrap()
}

#[test]
fn single_bug_against_empty_corpus() {
    for scorer in scorers() {
        let report = run(
            scorer,
            "Login button does not respond on mobile Safari",
            &CorpusSnapshot::empty(t0()),
        );

        assert_eq!(report.outcomes.len(), 1, "{scorer}");
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.item.kind, Kind::Bug);
        assert_eq!(outcome.decision.action, Action::CreateNew);
        assert_eq!(outcome.decision.target_issue, None);
        assert_eq!(outcome.decision.confidence, 1.0);
        assert!(outcome.decision.is_well_formed());
    }
}

#[test]
fn compound_feedback_splits_into_three_items() {
    for scorer in scorers() {
        let report = run(
            scorer,
            "Login is broken, password reset doesn't work, and we need 2FA",
            &snapshot_with([]),
        );

        let kinds: Vec<Kind> = report.outcomes.iter().map(|o| o.item.kind).collect();
        assert_eq!(kinds, vec![Kind::Bug, Kind::Bug, Kind::Feature], "{scorer}");
        assert!(report.outcomes.iter().all(|o| o.item.parent_id.is_some()));
        assert_eq!(report.summary.items, 3);
        assert_eq!(report.summary.bugs, 2);
        assert_eq!(report.summary.features, 1);
        assert_eq!(report.lineage.len(), 1);
    }
}

#[test]
fn paraphrase_of_open_issue_becomes_comment() {
    let snapshot = snapshot_with([checkout_issue(), login_issue_closed(10)]);
    for scorer in scorers() {
        let report = run(scorer, "Submit button doesn't work on checkout", &snapshot);

        let decision = &report.outcomes[0].decision;
        assert_eq!(decision.action, Action::CommentOnOpen, "{scorer}: {:?}", decision.rationale);
        assert_eq!(decision.target_issue, Some(456));
        assert!(decision.confidence >= 0.75);
        assert!(decision.rationale[0].starts_with("rule 2"));
    }
}

#[test]
fn recent_regression_reopens_closed_issue() {
    let snapshot = snapshot_with([login_issue_closed(10), checkout_issue()]);
    for scorer in scorers() {
        let report = run(
            scorer,
            "Login still broken on mobile, started again yesterday",
            &snapshot,
        );

        assert_eq!(report.outcomes.len(), 1);
        let decision = &report.outcomes[0].decision;
        assert_eq!(decision.action, Action::ReopenClosed, "{scorer}: {:?}", decision.rationale);
        assert_eq!(decision.target_issue, Some(123));
        assert!(decision.rationale[0].contains("regression language"));
        assert!(decision.confidence > 0.0 && decision.confidence < 1.0);
        assert_eq!(report.summary.reopen_closed, 1);
    }
}

#[test]
fn stale_closed_issue_is_linked_not_reopened() {
    let snapshot = snapshot_with([login_issue_closed(400)]);
    for scorer in scorers() {
        let report = run(
            scorer,
            "Login still broken on mobile, started again yesterday",
            &snapshot,
        );

        let decision = &report.outcomes[0].decision;
        assert_eq!(decision.action, Action::CreateNew, "{scorer}: {:?}", decision.rationale);
        assert_eq!(decision.target_issue, None);
        assert_eq!(decision.related_issues, vec![123]);
        assert!(decision.rationale[0].contains("#123"));
        assert!(decision.rationale[0].contains("outside the 60-day window"));
        assert!(!decision.has_flag(DecisionFlag::PossibleDuplicate));
    }
}

#[test]
fn submission_time_drives_reopen_window() {
    // Closed 10 days before t0; received 100 days later it is out of window
    let snapshot = snapshot_with([login_issue_closed(10)]);
    let late = triage_core::Submission::new("Login still broken on mobile, started again yesterday")
        .received_at(t0() + chrono::Duration::days(100));

    let report = TriageOrchestrator::new(TriageConfig::default())
        .unwrap()
        .triage_with_snapshot(&late, &snapshot)
        .unwrap();
    assert_eq!(report.outcomes[0].decision.action, Action::CreateNew);
    assert_eq!(report.reference_time, t0() + chrono::Duration::days(100));
}
