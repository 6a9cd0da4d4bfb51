//! Image puller contract.

use async_trait::async_trait;
use podlet_api::pod::Secret;
use podlet_api::{Container, Pod};
use podlet_common::PodletError;

/// Failure to make a container's image available.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EnsureImageError {
    /// Short human-readable failure message, reported verbatim.
    pub message: String,
    /// The underlying error.
    #[source]
    pub error: PodletError,
}

impl EnsureImageError {
    /// Create an image failure.
    pub fn new(message: impl Into<String>, error: PodletError) -> Self {
        Self {
            message: message.into(),
            error,
        }
    }
}

/// Makes container images available to the runtime.
#[async_trait]
pub trait ImagePuller: Send + Sync {
    /// Ensure the image of `container` is present, pulling it with
    /// `pull_secrets` if the pull policy requires.
    async fn ensure_image_exists(
        &self,
        pod: &Pod,
        container: &Container,
        pull_secrets: &[Secret],
    ) -> Result<(), EnsureImageError>;
}
