//! Trait contract tests for RegistryGateway.
//!
//! These tests verify the behavioral contract of the gateway trait using the
//! in-memory fake. Any conforming implementation must behave the same way.

use chrono::{TimeZone, Utc};
use registry_gateway::fakes::MemoryRegistryGateway;
use registry_gateway::gateway::*;
use registry_gateway::GatewayError;

fn image(seed: &str, tags: &[&str]) -> ImageRecord {
    ImageRecord::new(
        ImageDigest::from_bytes(seed.as_bytes()),
        tags.iter().map(|t| t.to_string()).collect(),
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
    )
}

// ===========================================================================
// Listing
// ===========================================================================

#[tokio::test]
async fn repositories_listed_in_insertion_order() {
    let gateway = MemoryRegistryGateway::new()
        .with_repository("zeta", vec![])
        .with_repository("alpha", vec![])
        .with_repository("mid", vec![]);

    let names: Vec<String> = gateway
        .list_repositories()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();

    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn empty_registry_lists_no_repositories() {
    let gateway = MemoryRegistryGateway::new();
    assert!(gateway.list_repositories().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_images_returns_seeded_snapshot() {
    let gateway = MemoryRegistryGateway::new()
        .with_repository("web", vec![image("a", &["v1"]), image("b", &[])]);

    let images = gateway.list_images("web").await.unwrap();
    assert_eq!(images.len(), 2);
    assert!(images[1].is_untagged());
}

#[tokio::test]
async fn list_images_unknown_repository_is_not_found() {
    let gateway = MemoryRegistryGateway::new();
    let err = gateway.list_images("ghost").await.unwrap_err();
    assert!(matches!(err, GatewayError::RepositoryNotFound { .. }));
}

#[tokio::test]
async fn injected_list_failures_surface() {
    let gateway = MemoryRegistryGateway::new()
        .with_repository("web", vec![])
        .fail_list_images("web", GatewayError::Connection("reset".into()));

    assert!(gateway.list_images("web").await.is_err());

    let gateway = MemoryRegistryGateway::new()
        .fail_list_repositories(GatewayError::Connection("denied".into()));
    assert!(gateway.list_repositories().await.is_err());
}

// ===========================================================================
// Deletion
// ===========================================================================

#[tokio::test]
async fn delete_removes_only_the_target_digest() {
    let keep = image("keep", &["v1"]);
    let expired = image("expired", &["v1"]);
    let gateway = MemoryRegistryGateway::new()
        .with_repository("web", vec![keep.clone(), expired.clone()]);

    gateway.delete_image("web", &expired.digest).await.unwrap();

    let remaining = gateway.images("web");
    assert_eq!(remaining, vec![keep]);
    assert_eq!(gateway.delete_calls(), vec![("web".to_string(), expired.digest)]);
}

#[tokio::test]
async fn delete_missing_digest_is_rejected() {
    let gateway = MemoryRegistryGateway::new().with_repository("web", vec![]);
    let missing = ImageDigest::from_bytes(b"missing");

    let err = gateway.delete_image("web", &missing).await.unwrap_err();
    assert!(matches!(err, GatewayError::DeleteRejected { .. }));
}

#[tokio::test]
async fn injected_delete_failure_is_recorded_and_image_survives() {
    let stuck = image("stuck", &[]);
    let gateway = MemoryRegistryGateway::new()
        .with_repository("web", vec![stuck.clone()])
        .fail_delete(
            &stuck.digest,
            GatewayError::DeleteRejected {
                repository: "web".into(),
                digest: stuck.digest.to_string(),
                reason: "AccessDenied".into(),
            },
        );

    assert!(gateway.delete_image("web", &stuck.digest).await.is_err());
    assert_eq!(gateway.delete_calls().len(), 1);
    assert_eq!(gateway.images("web"), vec![stuck]);
}
