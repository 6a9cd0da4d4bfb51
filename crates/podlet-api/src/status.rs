//! Normalized agent-side container and pod views.
//!
//! These are rebuilt from runtime reports on every query and never cached.

use chrono::{DateTime, Utc};
use podlet_common::ContainerId;
use serde::{Deserialize, Serialize};

use crate::runtime;

/// Agent-side container state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KubeContainerState {
    /// Created but not started.
    Created,
    /// Running.
    Running,
    /// Exited.
    Exited,
    /// State could not be determined.
    #[default]
    Unknown,
}

impl From<runtime::ContainerState> for KubeContainerState {
    fn from(state: runtime::ContainerState) -> Self {
        match state {
            runtime::ContainerState::Created => Self::Created,
            runtime::ContainerState::Running => Self::Running,
            runtime::ContainerState::Exited => Self::Exited,
            runtime::ContainerState::Unknown => Self::Unknown,
        }
    }
}

impl std::fmt::Display for KubeContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Exited => write!(f, "exited"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Normalized status of one container instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    /// Composite container ID.
    pub id: ContainerId,
    /// Container name from the pod spec.
    pub name: String,
    /// Lifecycle state.
    pub state: KubeContainerState,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Start time, for running containers.
    pub started_at: Option<DateTime<Utc>>,
    /// Finish time, for containers that have exited.
    pub finished_at: Option<DateTime<Utc>>,
    /// Exit code of the last run.
    pub exit_code: i32,
    /// Image reference.
    pub image: String,
    /// Resolved image ID.
    pub image_id: String,
    /// Content hash of the container spec the instance was created from.
    pub hash: u64,
    /// Number of restarts before this instance.
    pub restart_count: u32,
    /// Short reason for the state.
    pub reason: String,
    /// Termination message recovered from the container.
    pub message: String,
}

impl ContainerStatus {
    /// Returns true while the container has neither finished nor reported a
    /// non-zero exit code.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.finished_at.is_none() && self.exit_code == 0
    }
}

/// Status of every known container instance of a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    /// Pod UID.
    pub id: String,
    /// Pod name.
    pub name: String,
    /// Pod namespace.
    pub namespace: String,
    /// Container statuses, oldest first.
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
}

impl PodStatus {
    /// The most recent status recorded for a container name.
    #[must_use]
    pub fn find_container_status_by_name(&self, name: &str) -> Option<&ContainerStatus> {
        self.container_statuses
            .iter()
            .filter(|status| status.name == name)
            .max_by_key(|status| status.created_at)
    }
}

/// A pod as currently known to the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningPod {
    /// Pod UID.
    pub id: String,
    /// Pod name.
    pub name: String,
    /// Pod namespace.
    pub namespace: String,
    /// Container instances of the pod.
    #[serde(default)]
    pub containers: Vec<RunningContainer>,
}

/// A container instance as currently known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningContainer {
    /// Composite container ID.
    pub id: ContainerId,
    /// Container name.
    pub name: String,
    /// Image reference.
    #[serde(default)]
    pub image: String,
    /// Content hash of the originating spec.
    #[serde(default)]
    pub hash: u64,
    /// Lifecycle state.
    #[serde(default)]
    pub state: KubeContainerState,
}
