//! Cleanup runner.
//!
//! Walks every repository the gateway lists, classifies each image and
//! applies delete verdicts unless the policy is a dry run. Repositories and
//! images are processed strictly one at a time, in gateway order.
//!
//! Only failing to enumerate repositories aborts a run. A repository whose
//! image listing fails, or an image whose deletion fails, is recorded in the
//! report and the run moves on.

use chrono::{DateTime, Utc};
use registry_gateway::{ImageRecord, RegistryGateway};
use std::time::Instant;
use tracing::Instrument;

use crate::classifier::RetentionClassifier;
use crate::domain::{PolicyConfig, Result, RetentionError, Verdict};
use crate::obs::{
    emit_empty_prefix_warning, emit_image_missing_push_time, emit_image_outcome,
    emit_no_repositories, emit_repository_empty, emit_repository_list_failed,
    emit_repository_started, emit_run_aborted, emit_run_finished, emit_run_started, run_span,
};
use crate::report::{ImageAction, ImageOutcome, ReportBuilder, RepositoryOutcome, RunReport};

/// Applies a retention policy to every repository behind a gateway.
#[derive(Debug, Clone)]
pub struct CleanupRunner {
    policy: PolicyConfig,
}

impl CleanupRunner {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Run the cleanup, measuring image ages against the current UTC time.
    pub async fn run(&self, gateway: &dyn RegistryGateway) -> Result<RunReport> {
        self.run_at(gateway, Utc::now()).await
    }

    /// Run the cleanup with a fixed evaluation instant (used for deterministic tests).
    pub async fn run_at(
        &self,
        gateway: &dyn RegistryGateway,
        now: DateTime<Utc>,
    ) -> Result<RunReport> {
        let report = ReportBuilder::new(&self.policy, now);
        let span = run_span(&report.run_id().to_string(), self.policy.region());
        self.execute(gateway, report, now).instrument(span).await
    }

    async fn execute(
        &self,
        gateway: &dyn RegistryGateway,
        mut report: ReportBuilder,
        now: DateTime<Utc>,
    ) -> Result<RunReport> {
        let started = Instant::now();
        emit_run_started(
            self.policy.region(),
            &self.policy.max_age_display(),
            self.policy.keep_prefixes(),
            self.policy.dry_run(),
        );
        if self.policy.has_empty_prefix() {
            emit_empty_prefix_warning();
        }

        let repositories = match gateway.list_repositories().await {
            Ok(repositories) => repositories,
            Err(e) => {
                emit_run_aborted(&e);
                return Err(RetentionError::ListRepositories(e));
            }
        };

        if repositories.is_empty() {
            emit_no_repositories(self.policy.region());
        }

        let classifier = RetentionClassifier::new(&self.policy, now);
        for repository in &repositories {
            let outcome = self
                .process_repository(gateway, &classifier, &repository.name)
                .await;
            report.push(outcome);
        }

        let report = report.finish(Utc::now());
        emit_run_finished(started.elapsed().as_millis() as u64, &report.totals);
        Ok(report)
    }

    async fn process_repository(
        &self,
        gateway: &dyn RegistryGateway,
        classifier: &RetentionClassifier<'_>,
        repository: &str,
    ) -> RepositoryOutcome {
        emit_repository_started(repository);

        let images = match gateway.list_images(repository).await {
            Ok(images) => images,
            Err(e) => {
                emit_repository_list_failed(repository, &e);
                return RepositoryOutcome::list_failed(repository, e);
            }
        };

        if images.is_empty() {
            emit_repository_empty(repository);
            return RepositoryOutcome::no_images(repository);
        }

        let mut outcome = RepositoryOutcome::processed(repository);
        for image in &images {
            let (Some(verdict), Some(age)) = (classifier.classify(image), classifier.age_of(image))
            else {
                emit_image_missing_push_time(repository, image.digest.as_str());
                outcome.skipped_without_push_time += 1;
                continue;
            };

            let action = self.apply(gateway, repository, image, &verdict).await;
            let image_outcome = ImageOutcome {
                repository: repository.to_string(),
                digest: image.digest.clone(),
                tags: image.tags.clone(),
                age,
                verdict,
                action,
            };
            emit_image_outcome(&image_outcome, self.policy.age_unit());
            outcome.images.push(image_outcome);
        }
        outcome
    }

    async fn apply(
        &self,
        gateway: &dyn RegistryGateway,
        repository: &str,
        image: &ImageRecord,
        verdict: &Verdict,
    ) -> ImageAction {
        if !verdict.is_delete() {
            return ImageAction::Retained;
        }
        if self.policy.dry_run() {
            return ImageAction::SkippedDryRun;
        }

        match gateway.delete_image(repository, &image.digest).await {
            Ok(()) => ImageAction::Deleted,
            Err(e) => ImageAction::DeleteFailed {
                error: e.to_string(),
            },
        }
    }
}
