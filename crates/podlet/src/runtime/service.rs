//! Container runtime service contract.

use async_trait::async_trait;
use podlet_api::Pod;
use podlet_api::pod::PodLogOptions;
use podlet_api::runtime::{Container, ContainerConfig, ContainerFilter, ContainerStatus, PodSandboxConfig};
use podlet_common::{ContainerId, PodletResult};
use tokio::io::{AsyncRead, AsyncWrite};

/// Request/response interface to a container runtime backend.
///
/// Calls block until the backend answers; bounding them is the
/// implementation's responsibility.
#[async_trait]
pub trait RuntimeService: Send + Sync {
    /// Create a container in a sandbox and return its runtime-assigned ID.
    async fn create_container(
        &self,
        pod_sandbox_id: &str,
        config: &ContainerConfig,
        sandbox_config: &PodSandboxConfig,
    ) -> PodletResult<String>;

    /// Start a created container.
    async fn start_container(&self, id: &str) -> PodletResult<()>;

    /// Stop a container, allowing `timeout` seconds before forcing it.
    async fn stop_container(&self, id: &str, timeout: i64) -> PodletResult<()>;

    /// Remove a container.
    async fn remove_container(&self, id: &str) -> PodletResult<()>;

    /// List containers matching `filter`.
    async fn list_containers(&self, filter: &ContainerFilter) -> PodletResult<Vec<Container>>;

    /// Detailed status of one container.
    async fn container_status(&self, id: &str) -> PodletResult<ContainerStatus>;

    /// The log/exec capability, for backends that provide it.
    fn streaming(&self) -> Option<&dyn StreamingRuntime> {
        None
    }
}

/// Optional log and exec passthrough offered by some backends.
#[async_trait]
pub trait StreamingRuntime: Send + Sync {
    /// Copy a container's logs to `stdout`/`stderr`.
    async fn container_logs(
        &self,
        pod: &Pod,
        id: &ContainerId,
        options: &PodLogOptions,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> PodletResult<()>;

    /// Run `cmd` inside a container, wiring up its standard streams.
    async fn exec_in_container(
        &self,
        id: &ContainerId,
        cmd: &[String],
        stdin: Option<&mut (dyn AsyncRead + Send + Unpin)>,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
        tty: bool,
    ) -> PodletResult<()>;
}
