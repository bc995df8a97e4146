//! In-memory fake for `RegistryGateway` (testing only)
//!
//! `MemoryRegistryGateway` holds repositories in insertion order, removes
//! images on successful delete, records every delete call, and supports
//! failure injection per operation so callers can exercise their error paths
//! without a real registry.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::gateway::*;

#[derive(Debug, Default)]
struct RegistryState {
    repositories: Vec<(String, Vec<ImageRecord>)>,
    delete_calls: Vec<(String, ImageDigest)>,
}

#[derive(Debug, Default)]
struct FailureInjection {
    list_repositories: Option<GatewayError>,
    list_images: HashMap<String, GatewayError>,
    delete: HashMap<ImageDigest, GatewayError>,
}

/// In-memory registry backed by an ordered list of repositories.
#[derive(Debug, Default)]
pub struct MemoryRegistryGateway {
    state: Mutex<RegistryState>,
    failures: Mutex<FailureInjection>,
}

impl MemoryRegistryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository holding `images`. Repositories are listed in the
    /// order they were added.
    pub fn with_repository(self, name: &str, images: Vec<ImageRecord>) -> Self {
        self.state
            .lock()
            .unwrap()
            .repositories
            .push((name.to_string(), images));
        self
    }

    /// Make `list_repositories` fail with `err`.
    pub fn fail_list_repositories(self, err: GatewayError) -> Self {
        self.failures.lock().unwrap().list_repositories = Some(err);
        self
    }

    /// Make `list_images(repository)` fail with `err`.
    pub fn fail_list_images(self, repository: &str, err: GatewayError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .list_images
            .insert(repository.to_string(), err);
        self
    }

    /// Make `delete_image` fail with `err` whenever it targets `digest`.
    pub fn fail_delete(self, digest: &ImageDigest, err: GatewayError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .delete
            .insert(digest.clone(), err);
        self
    }

    /// Every `(repository, digest)` passed to `delete_image`, in call order,
    /// including calls that failed.
    pub fn delete_calls(&self) -> Vec<(String, ImageDigest)> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    /// Images currently stored in `repository`.
    pub fn images(&self, repository: &str) -> Vec<ImageRecord> {
        self.state
            .lock()
            .unwrap()
            .repositories
            .iter()
            .find(|(name, _)| name == repository)
            .map(|(_, images)| images.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RegistryGateway for MemoryRegistryGateway {
    async fn list_repositories(&self) -> GatewayResult<Vec<RepositoryRecord>> {
        if let Some(err) = &self.failures.lock().unwrap().list_repositories {
            return Err(err.clone());
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .repositories
            .iter()
            .map(|(name, _)| RepositoryRecord::new(name.clone()))
            .collect())
    }

    async fn list_images(&self, repository: &str) -> GatewayResult<Vec<ImageRecord>> {
        if let Some(err) = self.failures.lock().unwrap().list_images.get(repository) {
            return Err(err.clone());
        }
        let state = self.state.lock().unwrap();
        state
            .repositories
            .iter()
            .find(|(name, _)| name == repository)
            .map(|(_, images)| images.clone())
            .ok_or_else(|| GatewayError::RepositoryNotFound {
                name: repository.to_string(),
            })
    }

    async fn delete_image(&self, repository: &str, digest: &ImageDigest) -> GatewayResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .delete_calls
            .push((repository.to_string(), digest.clone()));

        if let Some(err) = self.failures.lock().unwrap().delete.get(digest) {
            return Err(err.clone());
        }

        let images = state
            .repositories
            .iter_mut()
            .find(|(name, _)| name == repository)
            .map(|(_, images)| images)
            .ok_or_else(|| GatewayError::RepositoryNotFound {
                name: repository.to_string(),
            })?;

        let before = images.len();
        images.retain(|image| image.digest != *digest);
        if images.len() == before {
            return Err(GatewayError::DeleteRejected {
                repository: repository.to_string(),
                digest: digest.to_string(),
                reason: "ImageNotFound".to_string(),
            });
        }
        Ok(())
    }
}
