//! Triage orchestrator
//!
//! Sequences parsing, splitting, similarity and decisions for one submission.
//! All stages after the corpus fetch are pure functions of the submission,
//! the snapshot and the configuration, so the same inputs always serialize to
//! the same report.

use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use triage_model::{text, Fingerprint, IssueState};
use triage_parser::{ComplexityAnalyzer, FeedbackParser, SplitOutcome};
use triage_similarity::{
    CorpusSnapshot, QueryBudget, SimilarityIndex, SimilarityStrategy, StrategyRegistry,
};

use crate::config::TriageConfig;
use crate::decision::DecisionEngine;
use crate::error::{RepositoryError, TriageError, TriageWarning};
use crate::repository::IssueRepository;
use crate::types::{
    Action, DecisionFlag, LineageEntry, Submission, TriageOutcome, TriageReport, TriageSummary,
};

/// Runs the triage pipeline
///
/// Holds no mutable state; one orchestrator serves any number of concurrent
/// submissions.
#[derive(Clone)]
pub struct TriageOrchestrator {
    config: TriageConfig,
    parser: FeedbackParser,
    analyzer: ComplexityAnalyzer,
    index: SimilarityIndex,
    engine: DecisionEngine,
    repository: Option<Arc<dyn IssueRepository>>,
}

impl std::fmt::Debug for TriageOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageOrchestrator")
            .field("config", &self.config)
            .field("scorer", &self.index.strategy().name())
            .field("repository", &self.repository.is_some())
            .finish_non_exhaustive()
    }
}

impl TriageOrchestrator {
    /// Create orchestrator, resolving the scorer among the built-in strategies
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or names an unknown scorer
    pub fn new(config: TriageConfig) -> Result<Self, TriageError> {
        Self::with_registry(config, &StrategyRegistry::with_defaults())
    }

    /// Create orchestrator, resolving the scorer in `registry`
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or names an unknown scorer
    pub fn with_registry(
        config: TriageConfig,
        registry: &StrategyRegistry,
    ) -> Result<Self, TriageError> {
        config.validate()?;
        let strategy = registry.get(&config.scorer)?;
        let index = SimilarityIndex::new(strategy).with_config(config.similarity())?;

        Ok(Self {
            parser: config.parser(),
            analyzer: config.analyzer(),
            engine: DecisionEngine::from_config(&config),
            index,
            config,
            repository: None,
        })
    }

    /// Replace the scorer
    ///
    /// # Errors
    /// Returns error if the similarity parameters are invalid
    pub fn with_strategy(
        mut self,
        strategy: Arc<dyn SimilarityStrategy>,
    ) -> Result<Self, TriageError> {
        self.index = SimilarityIndex::new(strategy).with_config(self.config.similarity())?;
        self.config.scorer = self.index.strategy().name().to_string();
        Ok(self)
    }

    /// Attach the repository [`triage`](Self::triage) fetches from
    #[inline]
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn IssueRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Triage a submission against the repository's current corpus
    ///
    /// The text is validated before any fetch. Open and closed issues are
    /// listed concurrently, bounded by `fetch_timeout_ms`; a failed or slow
    /// fetch is returned as [`TriageError::RepositoryUnavailable`] without
    /// retrying.
    ///
    /// # Errors
    /// Returns error for invalid input, an unavailable repository, or a
    /// snapshot inconsistency
    pub async fn triage(&self, submission: &Submission) -> Result<TriageReport, TriageError> {
        self.triage_until(submission, None).await
    }

    /// Like [`triage`](Self::triage), with a deadline on the similarity
    /// queries that run after the fetch
    ///
    /// # Errors
    /// Returns error for invalid input, an unavailable repository, or a
    /// snapshot inconsistency
    pub async fn triage_until(
        &self,
        submission: &Submission,
        deadline: Option<std::time::Instant>,
    ) -> Result<TriageReport, TriageError> {
        let split = self.split(submission)?;
        let repository = self
            .repository
            .as_ref()
            .ok_or(RepositoryError::NotConfigured)?;

        let after_ms = self.config.fetch_timeout_ms;
        let fetch = async {
            futures::try_join!(
                repository.list(IssueState::Open),
                repository.list(IssueState::Closed)
            )
        };
        let (open, closed) = tokio::time::timeout(Duration::from_millis(after_ms), fetch)
            .await
            .map_err(|_| RepositoryError::Timeout { after_ms })
            .and_then(|fetched| fetched)
            .map_err(|e| {
                warn!(error = %e, "corpus fetch failed");
                e
            })?;

        let as_of = submission.received_at.unwrap_or_else(chrono::Utc::now);
        let snapshot = CorpusSnapshot::from_issues(open.into_iter().chain(closed), as_of);
        debug!(
            issues = snapshot.len(),
            version = snapshot.version(),
            "corpus fetched"
        );

        self.decide_all(submission, split, &snapshot, &self.budget(deadline))
    }

    /// Triage a submission against an already-fetched snapshot
    ///
    /// # Errors
    /// Returns error for invalid input or a snapshot inconsistency
    pub fn triage_with_snapshot(
        &self,
        submission: &Submission,
        snapshot: &CorpusSnapshot,
    ) -> Result<TriageReport, TriageError> {
        self.triage_with_budget(submission, snapshot, None)
    }

    /// Triage with a deadline on the similarity queries
    ///
    /// Queries that reach the deadline return partial rankings; affected
    /// decisions are flagged and their confidence reduced.
    ///
    /// # Errors
    /// Returns error for invalid input or a snapshot inconsistency
    pub fn triage_with_budget(
        &self,
        submission: &Submission,
        snapshot: &CorpusSnapshot,
        deadline: Option<std::time::Instant>,
    ) -> Result<TriageReport, TriageError> {
        let split = self.split(submission)?;
        self.decide_all(submission, split, snapshot, &self.budget(deadline))
    }

    /// Triage independent submissions in parallel; results keep input order
    #[must_use]
    pub fn triage_batch(
        &self,
        submissions: &[Submission],
        snapshot: &CorpusSnapshot,
    ) -> Vec<Result<TriageReport, TriageError>> {
        info!(
            submissions = submissions.len(),
            snapshot = snapshot.version(),
            "triaging batch"
        );
        submissions
            .par_iter()
            .map(|submission| self.triage_with_snapshot(submission, snapshot))
            .collect()
    }

    fn budget(&self, deadline: Option<std::time::Instant>) -> QueryBudget {
        deadline
            .map_or_else(QueryBudget::unbounded, QueryBudget::until)
            .with_chunk_size(self.config.query_chunk_size)
    }

    fn split(&self, submission: &Submission) -> Result<SplitOutcome, TriageError> {
        let items = self.parser.parse(&submission.text)?;
        let outcome = self.analyzer.analyze_all(items);
        debug!(
            atomic = outcome.atomic.len(),
            replaced = outcome.replaced.len(),
            "feedback parsed"
        );
        Ok(outcome)
    }

    fn decide_all(
        &self,
        submission: &Submission,
        split: SplitOutcome,
        snapshot: &CorpusSnapshot,
        budget: &QueryBudget,
    ) -> Result<TriageReport, TriageError> {
        let reference_time = submission.received_at.unwrap_or_else(|| snapshot.as_of());
        let snapshot = snapshot.at(reference_time);

        let SplitOutcome {
            atomic,
            replaced,
            warnings: split_warnings,
        } = split;

        let mut warnings: Vec<TriageWarning> =
            atomic.iter().filter_map(TriageWarning::for_item).collect();
        warnings.extend(split_warnings);

        let mut outcomes: Vec<TriageOutcome> = Vec::with_capacity(atomic.len());
        for item in atomic {
            let search = self.index.query(&item, &snapshot, budget);
            let mut decision = self.engine.decide(&item, &search, &snapshot)?;

            if decision.action == Action::CreateNew {
                if let Some(sibling) = self.earlier_sibling(&item.title, &outcomes) {
                    decision.flag(DecisionFlag::DuplicateOfSibling);
                    decision.because(format!("title nearly duplicates item {sibling}"));
                }
            }

            debug!(
                item = %item.id,
                action = %decision.action,
                target = ?decision.target_issue,
                confidence = decision.confidence,
                "decided"
            );
            outcomes.push(TriageOutcome { item, decision });
        }

        let lineage = lineage(&replaced, &outcomes);
        let summary = TriageSummary::from_outcomes(&outcomes);
        let report = TriageReport {
            fingerprint: self.fingerprint(submission),
            snapshot_version: snapshot.version(),
            corpus_fingerprint: snapshot.fingerprint(),
            reference_time,
            scorer: self.index.strategy().name().to_string(),
            outcomes,
            lineage,
            warnings,
            summary,
        };

        info!(
            fingerprint = %report.fingerprint.short(),
            snapshot = report.snapshot_version,
            items = report.summary.items,
            create = report.summary.create_new,
            comment = report.summary.comment_on_open,
            reopen = report.summary.reopen_closed,
            warnings = report.warnings.len(),
            "triage complete"
        );
        Ok(report)
    }

    /// First earlier item whose title nearly matches `title`
    fn earlier_sibling(
        &self,
        title: &str,
        earlier: &[TriageOutcome],
    ) -> Option<triage_model::ItemId> {
        let tokens = text::token_set(title);
        if tokens.is_empty() {
            return None;
        }
        earlier
            .iter()
            .find(|o| {
                text::jaccard(&tokens, &text::token_set(&o.item.title))
                    >= self.config.sibling_duplicate_threshold
            })
            .map(|o| o.item.id.clone())
    }

    fn fingerprint(&self, submission: &Submission) -> Fingerprint {
        let config = serde_json::to_vec(&self.config).unwrap_or_default();
        Fingerprint::compute_parts([submission.text.as_bytes(), config.as_slice()])
    }
}

/// Backlinks for replaced items, children in source order
fn lineage(
    replaced: &[triage_model::FeedbackItem],
    outcomes: &[TriageOutcome],
) -> Vec<LineageEntry> {
    let mut entries: Vec<LineageEntry> = replaced
        .iter()
        .map(|item| LineageEntry {
            id: item.id.clone(),
            parent_id: item.parent_id.clone(),
            title: item.title.clone(),
            children: replaced
                .iter()
                .chain(outcomes.iter().map(|o| &o.item))
                .filter(|child| child.parent_id.as_ref() == Some(&item.id))
                .map(|child| child.id.clone())
                .collect(),
        })
        .collect();

    for entry in &mut entries {
        entry.children.sort();
    }
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    entries
}
