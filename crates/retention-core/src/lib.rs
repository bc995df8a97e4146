//! ECR Retention Core Library
//!
//! Retention decision engine and cleanup runner for container image
//! registries. Re-exports the components needed to run a cleanup
//! programmatically.

pub mod classifier;
pub mod domain;
pub mod obs;
pub mod report;
pub mod reporting;
pub mod runner;
pub mod telemetry;

pub use classifier::{classify_at, matching_prefix, RetentionClassifier};

pub use domain::{
    parse_prefix_list, parse_retention, AgeUnit, ConfigError, KeepReason, PolicyConfig, Result,
    RetentionError, RetentionPeriod, Verdict,
};

pub use registry_gateway::{
    EcrGateway, GatewayError, ImageDigest, ImageRecord, RegistryGateway, RepositoryRecord,
};

pub use report::{
    ImageAction, ImageOutcome, ReportBuilder, ReportTotals, RepositoryOutcome, RepositoryStatus,
    RunReport,
};
pub use reporting::{render_summary_text, write_report_json};
pub use runner::CleanupRunner;

pub use obs::{
    emit_image_outcome, emit_repository_list_failed, emit_run_aborted, emit_run_finished,
    emit_run_started, run_span,
};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
