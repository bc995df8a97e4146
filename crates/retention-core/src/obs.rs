//! Structured observability hooks for cleanup runs.
//!
//! This module provides:
//! - A run-scoped tracing span via `run_span`
//! - Emission functions for run start/finish, repository notes, and one
//!   event per classified image carrying repository, digest, tags, age,
//!   verdict and action
//!
//! Every decision the runner makes passes through one of these functions,
//! so the log stream is a complete audit trail of the run.

use tracing::{error, info, warn};

use crate::domain::AgeUnit;
use crate::report::{ImageAction, ImageOutcome, ReportTotals};

/// Run-scoped span carrying the run id and region.
///
/// Attach it to the run future with `tracing::Instrument` so every event
/// emitted during the run is tagged, including across `.await` points.
///
/// # Example
///
/// ```ignore
/// let span = run_span("7c1f...", "us-east-1");
/// async { /* run */ }.instrument(span).await
/// ```
pub fn run_span(run_id: &str, region: &str) -> tracing::Span {
    tracing::info_span!("retention.run", run_id = %run_id, region = %region)
}

/// Emit event: run started with its effective policy.
pub fn emit_run_started(region: &str, max_age: &str, prefixes: &[String], dry_run: bool) {
    info!(
        event = "run.started",
        region = %region,
        max_age = %max_age,
        keep_prefixes = ?prefixes,
        dry_run = dry_run,
    );
}

/// Emit event: a policy containing the empty prefix keeps every tagged image.
pub fn emit_empty_prefix_warning() {
    warn!(
        event = "policy.empty_prefix",
        "empty keep-prefix matches every tag; only untagged images can be deleted"
    );
}

/// Emit event: region has no repositories.
pub fn emit_no_repositories(region: &str) {
    warn!(event = "run.no_repositories", region = %region, "no repositories found");
}

/// Emit event: processing of a repository begins.
pub fn emit_repository_started(repository: &str) {
    info!(event = "repository.started", repository = %repository);
}

/// Emit event: repository holds no images.
pub fn emit_repository_empty(repository: &str) {
    warn!(event = "repository.empty", repository = %repository, "no images found");
}

/// Emit event: listing images for a repository failed; the run continues.
pub fn emit_repository_list_failed(repository: &str, error: &dyn std::fmt::Display) {
    warn!(event = "repository.list_failed", repository = %repository, error = %error);
}

/// Emit event: image reported without a push time and left out of evaluation.
pub fn emit_image_missing_push_time(repository: &str, digest: &str) {
    tracing::debug!(
        event = "image.missing_push_time",
        repository = %repository,
        digest = %digest,
    );
}

/// Emit event: one classified image and what was done with it.
pub fn emit_image_outcome(outcome: &ImageOutcome, unit: AgeUnit) {
    let age = unit.format(outcome.age);
    match &outcome.action {
        ImageAction::DeleteFailed { error } => warn!(
            event = "image.outcome",
            repository = %outcome.repository,
            digest = %outcome.digest,
            tags = ?outcome.tags,
            age = %age,
            verdict = %outcome.verdict,
            action = outcome.action.label(),
            error = %error,
        ),
        action => info!(
            event = "image.outcome",
            repository = %outcome.repository,
            digest = %outcome.digest,
            tags = ?outcome.tags,
            age = %age,
            verdict = %outcome.verdict,
            action = action.label(),
        ),
    }
}

/// Emit event: run finished with its totals.
pub fn emit_run_finished(duration_ms: u64, totals: &ReportTotals) {
    info!(
        event = "run.finished",
        duration_ms = duration_ms,
        repositories = totals.repositories,
        repositories_failed = totals.repositories_failed,
        images_evaluated = totals.images_evaluated,
        kept = totals.kept,
        deleted = totals.deleted,
        skipped_dry_run = totals.skipped_dry_run,
        delete_failed = totals.delete_failed,
    );
}

/// Emit event: run aborted by a fatal error.
pub fn emit_run_aborted(error: &dyn std::fmt::Display) {
    error!(event = "run.aborted", error = %error);
}
