//! Domain-level error taxonomy for retention runs.

use registry_gateway::GatewayError;

/// Errors produced while validating run parameters.
///
/// All of these are raised before any registry call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("region must not be empty")]
    EmptyRegion,

    #[error("missing required parameter: {0}")]
    Missing(&'static str),

    #[error("retention must be a non-negative integer, got {0:?}")]
    InvalidRetention(String),

    #[error("unknown retention unit {0:?} (expected \"minutes\" or \"days\")")]
    InvalidUnit(String),

    #[error("retention of {amount} {unit} is out of range")]
    RetentionOverflow { amount: u64, unit: String },
}

/// Fatal errors that abort a cleanup run.
///
/// Per-repository and per-image failures never surface here; they are
/// recorded in the run report instead.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(#[source] GatewayError),

    #[error("failed to list repositories: {0}")]
    ListRepositories(#[source] GatewayError),
}

/// Result type for retention operations.
pub type Result<T> = std::result::Result<T, RetentionError>;
