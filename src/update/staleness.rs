// ABOUTME: Staleness verdicts: compare running digest against latest digest.
// ABOUTME: Resolution failures surface as errors; callers treat them as "not stale".

use super::error::UpdateError;
use crate::runtime::{ContainerSnapshot, ImageError, ImageOps};
use crate::types::{ImageId, ImageRef};
use std::time::Duration;

/// Two images are equal iff their content-addressed identifiers match.
/// Tag strings alone are never sufficient: a tag can be mutated to point
/// at a new digest.
pub fn is_stale(snapshot: &ContainerSnapshot, latest: &ImageId) -> bool {
    snapshot.image_id != *latest
}

/// Resolve the latest image identity for a reference.
///
/// Optionally pulls first so the local tag reflects the registry, then
/// inspects the local image. A failed pull is best effort and degrades to
/// resolving whatever the local cache holds; a failed inspect is a
/// [`UpdateError::Resolution`]. Staleness must never be assumed on
/// ambiguous input, so callers treat that error as "fresh" rather than
/// escalating it.
pub async fn resolve_latest<R: ImageOps>(
    runtime: &R,
    reference: &ImageRef,
    pull: bool,
    pull_timeout: Duration,
    api_timeout: Duration,
) -> Result<ImageId, UpdateError> {
    if pull {
        if let Err(error) = bounded_image(pull_timeout, runtime.pull_image(reference)).await {
            tracing::debug!(image = %reference, %error, "pull failed, resolving from local cache");
        }
    }

    bounded_image(api_timeout, runtime.resolve_digest(reference))
        .await
        .map_err(|source| UpdateError::Resolution {
            image: reference.to_string(),
            source,
        })
}

async fn bounded_image<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ImageError>>,
) -> Result<T, ImageError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ImageError::Runtime(format!(
            "operation timed out after {limit:?}"
        ))),
    }
}
