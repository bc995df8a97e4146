//! Registry gateway trait definitions
//!
//! `RegistryGateway` is the narrow interface the retention engine uses to
//! talk to a container registry:
//! - list repositories in a region
//! - list images (digest, tags, push time) in a repository
//! - delete a single image by content digest
//!
//! The trait is async and backend-agnostic. An in-memory fake lives in the
//! `fakes` module and the AWS implementation in `ecr`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::GatewayError;

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Content-addressed image identifier, e.g. `sha256:3f2a...`.
///
/// The inner field is private so every value has passed `TryFrom<String>`
/// or was produced by `from_bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageDigest(String);

impl ImageDigest {
    /// Compute the `sha256:` digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ImageDigest(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    /// Return the full digest string including the algorithm.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form: algorithm plus the first 12 hex chars.
    pub fn short(&self) -> &str {
        match self.0.find(':') {
            Some(idx) => &self.0[..(idx + 13).min(self.0.len())],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for ImageDigest {
    type Error = GatewayError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let valid = match s.split_once(':') {
            Some((algorithm, hex)) => {
                !algorithm.is_empty()
                    && algorithm
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                    && !hex.is_empty()
                    && hex.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        };
        if !valid {
            return Err(GatewayError::InvalidDigest { digest: s });
        }
        Ok(ImageDigest(s))
    }
}

impl From<ImageDigest> for String {
    fn from(digest: ImageDigest) -> Self {
        digest.0
    }
}

impl std::fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A repository within one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
}

impl RepositoryRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Snapshot of one stored image as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub digest: ImageDigest,
    /// Empty when the image is untagged
    pub tags: Vec<String>,
    /// `None` when the registry did not report a push time
    pub pushed_at: Option<DateTime<Utc>>,
}

impl ImageRecord {
    pub fn new(digest: ImageDigest, tags: Vec<String>, pushed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            digest,
            tags,
            pushed_at,
        }
    }

    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RegistryGateway
// ---------------------------------------------------------------------------

/// Access to a container registry in a single region.
///
/// Guarantees:
/// - `list_repositories` returns repositories in a stable order; callers
///   process them in that order.
/// - `delete_image` targets exactly one image by digest, never by tag, since
///   an image may carry zero or many tags.
/// - No call retries on its own unless the backing client does so
///   transparently.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// List every repository visible in the region.
    async fn list_repositories(&self) -> GatewayResult<Vec<RepositoryRecord>>;

    /// List every image stored in `repository`.
    async fn list_images(&self, repository: &str) -> GatewayResult<Vec<ImageRecord>>;

    /// Delete the image identified by `digest` from `repository`.
    async fn delete_image(&self, repository: &str, digest: &ImageDigest) -> GatewayResult<()>;
}
