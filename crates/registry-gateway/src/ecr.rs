//! Amazon ECR implementation of `RegistryGateway`.
//!
//! Wraps `aws_sdk_ecr::Client`. Listing operations follow `nextToken` until
//! the service reports no more pages; deletes go through `BatchDeleteImage`
//! with a single digest-only image identifier.

use std::future::Future;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ecr::error::DisplayErrorContext;
use aws_sdk_ecr::operation::batch_delete_image::BatchDeleteImageOutput;
use aws_sdk_ecr::operation::describe_images::DescribeImagesOutput;
use aws_sdk_ecr::operation::describe_repositories::DescribeRepositoriesOutput;
use aws_sdk_ecr::types::{ImageDetail, ImageIdentifier};
use aws_sdk_ecr::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::gateway::*;

/// Registry gateway backed by the AWS ECR API.
#[derive(Debug, Clone)]
pub struct EcrGateway {
    client: Client,
}

impl EcrGateway {
    /// Build a client for `region` from the default AWS configuration chain.
    ///
    /// Only an empty region fails here. Credentials are resolved lazily, so
    /// missing or expired credentials surface on the first request.
    pub async fn connect(region: &str) -> GatewayResult<Self> {
        let region = region.trim();
        if region.is_empty() {
            return Err(GatewayError::Connection("region is empty".to_string()));
        }

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        debug!(region = %region, "ECR client configured");
        Ok(Self {
            client: Client::new(&config),
        })
    }
}

/// One page of a paginated listing.
#[derive(Debug)]
struct Page<T> {
    items: Vec<T>,
    next_token: Option<String>,
}

/// Fetch pages until the service stops returning a continuation token.
async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> GatewayResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = GatewayResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut next_token = None;
    loop {
        let page = fetch_page(next_token.take()).await?;
        items.extend(page.items);
        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => return Ok(items),
        }
    }
}

fn repository_page(output: &DescribeRepositoriesOutput) -> Page<RepositoryRecord> {
    Page {
        items: output
            .repositories()
            .iter()
            .filter_map(|repo| repo.repository_name())
            .map(RepositoryRecord::new)
            .collect(),
        next_token: output.next_token().map(str::to_string),
    }
}

fn image_page(repository: &str, output: &DescribeImagesOutput) -> Page<ImageRecord> {
    let mut items = Vec::new();
    for detail in output.image_details() {
        match image_record(detail) {
            Some(record) => items.push(record),
            None => warn!(
                repository = %repository,
                digest = ?detail.image_digest(),
                "skipping image with missing or malformed digest"
            ),
        }
    }
    Page {
        items,
        next_token: output.next_token().map(str::to_string),
    }
}

/// `BatchDeleteImage` succeeds at the call level and reports per-image
/// problems in `failures`; any entry there means the image was not deleted.
fn delete_result(
    repository: &str,
    digest: &ImageDigest,
    output: &BatchDeleteImageOutput,
) -> GatewayResult<()> {
    let Some(failure) = output.failures().first() else {
        return Ok(());
    };
    let code = failure
        .failure_code()
        .map(|c| c.as_str().to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let reason = match failure.failure_reason() {
        Some(reason) => format!("{code}: {reason}"),
        None => code,
    };
    Err(GatewayError::DeleteRejected {
        repository: repository.to_string(),
        digest: digest.to_string(),
        reason,
    })
}

#[async_trait]
impl RegistryGateway for EcrGateway {
    async fn list_repositories(&self) -> GatewayResult<Vec<RepositoryRecord>> {
        collect_pages(move |token| async move {
            let output = self
                .client
                .describe_repositories()
                .set_next_token(token)
                .send()
                .await
                .map_err(|e| {
                    GatewayError::service("DescribeRepositories", DisplayErrorContext(&e).to_string())
                })?;
            Ok(repository_page(&output))
        })
        .await
    }

    async fn list_images(&self, repository: &str) -> GatewayResult<Vec<ImageRecord>> {
        collect_pages(move |token| async move {
            let output = self
                .client
                .describe_images()
                .repository_name(repository)
                .set_next_token(token)
                .send()
                .await
                .map_err(|e| {
                    let not_found = e
                        .as_service_error()
                        .map(|se| se.is_repository_not_found_exception())
                        .unwrap_or(false);
                    if not_found {
                        GatewayError::RepositoryNotFound {
                            name: repository.to_string(),
                        }
                    } else {
                        GatewayError::service("DescribeImages", DisplayErrorContext(&e).to_string())
                    }
                })?;
            Ok(image_page(repository, &output))
        })
        .await
    }

    async fn delete_image(&self, repository: &str, digest: &ImageDigest) -> GatewayResult<()> {
        let output = self
            .client
            .batch_delete_image()
            .repository_name(repository)
            .image_ids(
                ImageIdentifier::builder()
                    .image_digest(digest.as_str())
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                GatewayError::service("BatchDeleteImage", DisplayErrorContext(&e).to_string())
            })?;

        delete_result(repository, digest, &output)
    }
}

fn image_record(detail: &ImageDetail) -> Option<ImageRecord> {
    let digest = ImageDigest::try_from(detail.image_digest()?.to_string()).ok()?;
    let pushed_at = detail.image_pushed_at().and_then(to_chrono);
    Some(ImageRecord::new(
        digest,
        detail.image_tags().to_vec(),
        pushed_at,
    ))
}

fn to_chrono(ts: &aws_smithy_types::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ecr::types::{ImageFailure, ImageFailureCode, Repository};

    fn digest_str() -> String {
        format!("sha256:{}", "0f".repeat(32))
    }

    fn detail(seed: &str, tag: &str) -> ImageDetail {
        ImageDetail::builder()
            .image_digest(ImageDigest::from_bytes(seed.as_bytes()).as_str())
            .image_tags(tag)
            .image_pushed_at(aws_smithy_types::DateTime::from_secs(1_700_000_000))
            .build()
    }

    #[test]
    fn image_record_maps_tags_and_push_time() {
        let detail = ImageDetail::builder()
            .image_digest(digest_str())
            .image_tags("prod-v1")
            .image_tags("latest")
            .image_pushed_at(aws_smithy_types::DateTime::from_secs(1_700_000_000))
            .build();

        let record = image_record(&detail).expect("record");
        assert_eq!(record.digest.as_str(), digest_str());
        assert_eq!(record.tags, vec!["prod-v1".to_string(), "latest".to_string()]);
        assert_eq!(record.pushed_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn image_record_keeps_missing_push_time_as_none() {
        let detail = ImageDetail::builder().image_digest(digest_str()).build();
        let record = image_record(&detail).expect("record");
        assert!(record.pushed_at.is_none());
        assert!(record.is_untagged());
    }

    #[test]
    fn image_record_without_digest_is_dropped() {
        let detail = ImageDetail::builder().image_tags("latest").build();
        assert!(image_record(&detail).is_none());
    }

    #[test]
    fn to_chrono_preserves_subsecond_precision() {
        let ts = aws_smithy_types::DateTime::from_secs_and_nanos(1_700_000_000, 250_000_000);
        let converted = to_chrono(&ts).unwrap();
        assert_eq!(converted.timestamp_subsec_millis(), 250);
    }

    // -- BatchDeleteImage --------------------------------------------------

    #[test]
    fn delete_with_failure_entry_is_rejected() {
        let digest = ImageDigest::from_bytes(b"locked");
        let output = BatchDeleteImageOutput::builder()
            .failures(
                ImageFailure::builder()
                    .image_id(ImageIdentifier::builder().image_digest(digest.as_str()).build())
                    .failure_code(ImageFailureCode::ImageReferencedByManifestList)
                    .failure_reason("image is referenced by a manifest list")
                    .build(),
            )
            .build();

        let err = delete_result("web", &digest, &output).unwrap_err();
        match err {
            GatewayError::DeleteRejected {
                repository,
                digest: rejected,
                reason,
            } => {
                assert_eq!(repository, "web");
                assert_eq!(rejected, digest.to_string());
                assert!(reason.starts_with("ImageReferencedByManifestList: "));
                assert!(reason.contains("manifest list"));
            }
            other => panic!("expected DeleteRejected, got {other:?}"),
        }
    }

    #[test]
    fn delete_failure_without_code_or_reason_is_still_rejected() {
        let output = BatchDeleteImageOutput::builder()
            .failures(ImageFailure::builder().build())
            .build();
        let err = delete_result("web", &ImageDigest::from_bytes(b"x"), &output).unwrap_err();
        assert!(matches!(err, GatewayError::DeleteRejected { ref reason, .. } if reason == "Unknown"));
    }

    #[test]
    fn delete_without_failures_succeeds() {
        let digest = ImageDigest::from_bytes(b"gone");
        let output = BatchDeleteImageOutput::builder()
            .image_ids(ImageIdentifier::builder().image_digest(digest.as_str()).build())
            .build();
        assert!(delete_result("web", &digest, &output).is_ok());
    }

    // -- Pagination --------------------------------------------------------

    #[tokio::test]
    async fn repositories_are_collected_across_pages() {
        let mut pages = vec![
            DescribeRepositoriesOutput::builder()
                .repositories(Repository::builder().repository_name("web").build())
                .repositories(Repository::builder().repository_name("api").build())
                .next_token("page-2")
                .build(),
            DescribeRepositoriesOutput::builder()
                .repositories(Repository::builder().repository_name("worker").build())
                .build(),
        ]
        .into_iter();
        let mut tokens = Vec::new();

        let repositories = collect_pages(|token| {
            tokens.push(token);
            let page = repository_page(&pages.next().expect("no more pages"));
            async move { Ok(page) }
        })
        .await
        .unwrap();

        let names: Vec<_> = repositories.into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["web", "api", "worker"]);
        assert_eq!(tokens, [None, Some("page-2".to_string())]);
    }

    #[tokio::test]
    async fn images_are_collected_across_pages() {
        let mut pages = vec![
            DescribeImagesOutput::builder()
                .image_details(detail("a", "v1"))
                .next_token("t1")
                .build(),
            DescribeImagesOutput::builder()
                .image_details(detail("b", "v2"))
                .image_details(ImageDetail::builder().image_tags("no-digest").build())
                .next_token("t2")
                .build(),
            DescribeImagesOutput::builder()
                .image_details(detail("c", "v3"))
                .build(),
        ]
        .into_iter();

        let images = collect_pages(|_| {
            let page = image_page("web", &pages.next().expect("no more pages"));
            async move { Ok(page) }
        })
        .await
        .unwrap();

        let tags: Vec<_> = images.iter().map(|i| i.tags[0].as_str()).collect();
        assert_eq!(tags, ["v1", "v2", "v3"]);
    }

    #[tokio::test]
    async fn empty_continuation_token_ends_paging() {
        let mut calls = 0;
        let items = collect_pages(|_| {
            calls += 1;
            async {
                Ok(Page {
                    items: vec![1, 2],
                    next_token: Some(String::new()),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, [1, 2]);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn error_on_later_page_fails_the_listing() {
        let mut calls = 0;
        let result: GatewayResult<Vec<u8>> = collect_pages(|_| {
            calls += 1;
            let page = if calls == 1 {
                Ok(Page {
                    items: vec![1],
                    next_token: Some("more".into()),
                })
            } else {
                Err(GatewayError::service("DescribeImages", "ThrottlingException"))
            };
            async move { page }
        })
        .await;

        assert!(matches!(result, Err(GatewayError::Service { .. })));
        assert_eq!(calls, 2);
    }

    // -- connect -----------------------------------------------------------

    #[tokio::test]
    async fn connect_rejects_empty_region() {
        let err = EcrGateway::connect("  ").await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection(_)));
    }

    #[tokio::test]
    async fn connect_defers_credential_resolution() {
        assert!(EcrGateway::connect("eu-west-1").await.is_ok());
    }
}
