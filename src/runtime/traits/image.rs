// ABOUTME: Image operations trait for the daemon collaborator.
// ABOUTME: Pull images and resolve references to content-addressed digests.

use crate::types::{ImageId, ImageRef};
use async_trait::async_trait;

/// Image operations: pull and digest resolution.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Pull an image from its registry so the local tag points at the
    /// newest digest.
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError>;

    /// Resolve a reference to the content-addressed identifier of the image
    /// it currently points at locally.
    async fn resolve_digest(&self, reference: &ImageRef) -> Result<ImageId, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
