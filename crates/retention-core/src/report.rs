//! Run report: every per-repository and per-image outcome of a cleanup run.
//!
//! A [`ReportBuilder`] is filled by the runner while it works and turned into
//! an immutable [`RunReport`] once every repository has been visited.

use chrono::{DateTime, Duration, Utc};
use registry_gateway::ImageDigest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{PolicyConfig, Verdict};

/// What the runner did with a classified image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ImageAction {
    /// Verdict was keep; nothing to do.
    Retained,
    /// Verdict was delete but the run is a dry run.
    SkippedDryRun,
    Deleted,
    DeleteFailed { error: String },
}

impl ImageAction {
    pub fn label(&self) -> &'static str {
        match self {
            ImageAction::Retained => "retained",
            ImageAction::SkippedDryRun => "skipped-dry-run",
            ImageAction::Deleted => "deleted",
            ImageAction::DeleteFailed { .. } => "delete-failed",
        }
    }
}

/// Audit record for one classified image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOutcome {
    pub repository: String,
    pub digest: ImageDigest,
    pub tags: Vec<String>,
    /// Age in whole policy units at the run's evaluation instant
    #[serde(with = "crate::domain::duration_secs", rename = "age_secs")]
    pub age: Duration,
    pub verdict: Verdict,
    pub action: ImageAction,
}

/// How far processing of a repository got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryStatus {
    Processed,
    NoImages,
    ListFailed { error: String },
}

/// Outcome of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOutcome {
    pub name: String,
    pub status: RepositoryStatus,
    pub images: Vec<ImageOutcome>,
    /// Images the registry reported without a push time; never classified
    pub skipped_without_push_time: usize,
}

impl RepositoryOutcome {
    pub fn processed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: RepositoryStatus::Processed,
            images: Vec::new(),
            skipped_without_push_time: 0,
        }
    }

    pub fn no_images(name: impl Into<String>) -> Self {
        Self {
            status: RepositoryStatus::NoImages,
            ..Self::processed(name)
        }
    }

    pub fn list_failed(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            status: RepositoryStatus::ListFailed {
                error: error.to_string(),
            },
            ..Self::processed(name)
        }
    }
}

/// Aggregate counts over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub repositories: usize,
    pub repositories_failed: usize,
    pub repositories_empty: usize,
    pub images_evaluated: usize,
    pub kept: usize,
    pub delete_candidates: usize,
    pub deleted: usize,
    pub skipped_dry_run: usize,
    pub delete_failed: usize,
    pub skipped_without_push_time: usize,
}

impl ReportTotals {
    fn tally(repositories: &[RepositoryOutcome]) -> Self {
        let mut totals = ReportTotals {
            repositories: repositories.len(),
            ..Default::default()
        };
        for repo in repositories {
            match repo.status {
                RepositoryStatus::Processed => {}
                RepositoryStatus::NoImages => totals.repositories_empty += 1,
                RepositoryStatus::ListFailed { .. } => totals.repositories_failed += 1,
            }
            totals.skipped_without_push_time += repo.skipped_without_push_time;
            for image in &repo.images {
                totals.images_evaluated += 1;
                if image.verdict.is_delete() {
                    totals.delete_candidates += 1;
                } else {
                    totals.kept += 1;
                }
                match image.action {
                    ImageAction::Retained => {}
                    ImageAction::SkippedDryRun => totals.skipped_dry_run += 1,
                    ImageAction::Deleted => totals.deleted += 1,
                    ImageAction::DeleteFailed { .. } => totals.delete_failed += 1,
                }
            }
        }
        totals
    }
}

/// Finalized result of a cleanup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub region: String,
    pub dry_run: bool,
    /// The single instant every image age was measured against
    pub evaluated_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub repositories: Vec<RepositoryOutcome>,
    pub totals: ReportTotals,
}

impl RunReport {
    /// Every image outcome across all repositories, in processing order.
    pub fn outcomes(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.repositories.iter().flat_map(|repo| repo.images.iter())
    }

    /// `(repository, digest, verdict)` for each classified image.
    pub fn verdicts(&self) -> Vec<(&str, &ImageDigest, &Verdict)> {
        self.outcomes()
            .map(|o| (o.repository.as_str(), &o.digest, &o.verdict))
            .collect()
    }

    /// Look up the outcome for a digest in a repository.
    pub fn outcome(&self, repository: &str, digest: &ImageDigest) -> Option<&ImageOutcome> {
        self.outcomes()
            .find(|o| o.repository == repository && o.digest == *digest)
    }

    /// True when any repository listing or image deletion failed.
    pub fn has_failures(&self) -> bool {
        self.totals.repositories_failed > 0 || self.totals.delete_failed > 0
    }
}

/// Accumulates outcomes during a run.
#[derive(Debug)]
pub struct ReportBuilder {
    run_id: Uuid,
    region: String,
    dry_run: bool,
    evaluated_at: DateTime<Utc>,
    repositories: Vec<RepositoryOutcome>,
}

impl ReportBuilder {
    pub fn new(policy: &PolicyConfig, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            region: policy.region().to_string(),
            dry_run: policy.dry_run(),
            evaluated_at,
            repositories: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn push(&mut self, outcome: RepositoryOutcome) {
        self.repositories.push(outcome);
    }

    pub fn finish(self, finished_at: DateTime<Utc>) -> RunReport {
        let totals = ReportTotals::tally(&self.repositories);
        RunReport {
            run_id: self.run_id,
            region: self.region,
            dry_run: self.dry_run,
            evaluated_at: self.evaluated_at,
            finished_at,
            repositories: self.repositories,
            totals,
        }
    }
}
