//! Lifecycle hook runner contract.

use async_trait::async_trait;
use podlet_api::pod::Handler;
use podlet_api::{Container, Pod};
use podlet_common::{ContainerId, PodletError};

/// Failure of a lifecycle handler.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct HookError {
    /// Handler output describing the failure, reported in events.
    pub message: String,
    /// The underlying error.
    #[source]
    pub error: PodletError,
}

impl HookError {
    /// Create a hook failure.
    pub fn new(message: impl Into<String>, error: PodletError) -> Self {
        Self {
            message: message.into(),
            error,
        }
    }
}

/// Executes post-start and pre-stop handlers.
#[async_trait]
pub trait HookRunner: Send + Sync {
    /// Run `handler` against the container; returns the handler's output.
    ///
    /// # Errors
    ///
    /// Returns a [`HookError`] carrying the handler's output when it fails.
    async fn run(
        &self,
        container_id: &ContainerId,
        pod: &Pod,
        container: &Container,
        handler: &Handler,
    ) -> Result<String, HookError>;
}
