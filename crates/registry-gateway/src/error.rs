//! Error types for registry-gateway

use thiserror::Error;

/// Errors returned by a [`RegistryGateway`](crate::RegistryGateway).
///
/// Whether an error is fatal to a cleanup run is decided by the call site:
/// failing to enumerate repositories aborts, failing to list or delete
/// within one repository does not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Could not establish a session with the registry service
    #[error("registry connection failed: {0}")]
    Connection(String),

    /// The registry rejected or failed a request (transport, auth, throttling)
    #[error("registry request failed: {operation}: {message}")]
    Service { operation: String, message: String },

    /// Repository does not exist in this region
    #[error("repository not found: {name}")]
    RepositoryNotFound { name: String },

    /// The registry accepted the request but refused to delete the image
    #[error("delete rejected for {digest} in {repository}: {reason}")]
    DeleteRejected {
        repository: String,
        digest: String,
        reason: String,
    },

    /// Digest string is not of the form `<algorithm>:<hex>`
    #[error("invalid image digest: {digest}")]
    InvalidDigest { digest: String },
}

impl GatewayError {
    pub(crate) fn service(operation: &str, message: impl Into<String>) -> Self {
        GatewayError::Service {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}
