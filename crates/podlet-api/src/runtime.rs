//! Container runtime service types.
//!
//! The request/response shapes exchanged with the pluggable runtime backend:
//! the immutable create-time descriptor ([`ContainerConfig`]), list filters,
//! container summaries and detailed runtime status. Timestamps are unix
//! seconds; `0` means "not set".

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Immutable request to create a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerConfig {
    /// Name and attempt number.
    pub metadata: ContainerMetadata,
    /// Image to run.
    pub image: ImageSpec,
    /// Entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Arguments to the entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Working directory.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    /// Environment, in resolution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<KeyValue>,
    /// Host to container bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    /// Identifying labels.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    /// Opaque annotations.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
    /// Host path of the container log.
    pub log_path: PathBuf,
    /// Keep stdin open.
    #[serde(default)]
    pub stdin: bool,
    /// Close stdin after the first attach disconnects.
    #[serde(default)]
    pub stdin_once: bool,
    /// Allocate a TTY.
    #[serde(default)]
    pub tty: bool,
    /// Privileged mode; runtime default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    /// Read-only root filesystem; runtime default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readonly_rootfs: Option<bool>,
    /// Linux-specific configuration.
    pub linux: LinuxContainerConfig,
}

/// Container name and attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    /// Container name.
    pub name: String,
    /// Restart attempt, 0 for the first.
    #[serde(default)]
    pub attempt: u32,
}

/// Image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Image name or digest.
    pub image: String,
}

/// Environment entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
}

/// One host to container path binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mount {
    /// Volume name; empty for synthesized mounts.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Path on the host.
    pub host_path: PathBuf,
    /// Path inside the container.
    pub container_path: PathBuf,
    /// Mount read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    /// Relabel for SELinux.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selinux_relabel: Option<bool>,
}

/// Linux-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxContainerConfig {
    /// Resource limits in runtime units.
    pub resources: LinuxContainerResources,
    /// Capability adjustments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capability>,
    /// SELinux labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selinux_options: Option<SeLinuxOption>,
}

/// CPU and memory limits in runtime units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxContainerResources {
    /// Relative CPU weight, always at least 2.
    pub cpu_shares: i64,
    /// CFS quota in microseconds per period; -1 is unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_quota: Option<i64>,
    /// CFS period in microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_period: Option<i64>,
    /// Memory limit in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit_in_bytes: Option<i64>,
}

/// Capabilities to add and drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    /// Capabilities to add.
    #[serde(default)]
    pub add_capabilities: Vec<String>,
    /// Capabilities to drop.
    #[serde(default)]
    pub drop_capabilities: Vec<String>,
}

/// SELinux labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeLinuxOption {
    /// SELinux user.
    pub user: String,
    /// SELinux role.
    pub role: String,
    /// SELinux type.
    #[serde(rename = "type")]
    pub type_: String,
    /// SELinux level.
    pub level: String,
}

/// Sandbox configuration passed through on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSandboxConfig {
    /// Pod name.
    pub name: String,
    /// Pod namespace.
    pub namespace: String,
    /// Pod UID.
    pub uid: String,
    /// Sandbox attempt.
    #[serde(default)]
    pub attempt: u32,
    /// Directory container logs are placed under.
    #[serde(default)]
    pub log_directory: PathBuf,
}

/// Runtime-level container state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerState {
    /// Created but not started.
    Created,
    /// Running.
    Running,
    /// Exited.
    Exited,
    /// Unknown to the runtime.
    #[default]
    Unknown,
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Exited => write!(f, "EXITED"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Filter for listing containers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerFilter {
    /// Only containers in this state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ContainerState>,
    /// Only containers in this sandbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_sandbox_id: Option<String>,
    /// Only containers carrying all of these labels.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub label_selector: HashMap<String, String>,
}

impl ContainerFilter {
    /// Returns true if `container` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, container: &Container) -> bool {
        self.state.is_none_or(|state| state == container.state)
            && self
                .pod_sandbox_id
                .as_ref()
                .is_none_or(|id| *id == container.pod_sandbox_id)
            && self
                .label_selector
                .iter()
                .all(|(k, v)| container.labels.get(k) == Some(v))
    }
}

/// Container summary returned by list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Runtime-assigned ID.
    pub id: String,
    /// Owning sandbox.
    pub pod_sandbox_id: String,
    /// Name and attempt.
    pub metadata: ContainerMetadata,
    /// Image the container runs.
    pub image: ImageSpec,
    /// Resolved image ID.
    #[serde(default)]
    pub image_ref: String,
    /// Current state.
    pub state: ContainerState,
    /// Creation time (unix seconds).
    #[serde(default)]
    pub created_at: i64,
    /// Labels set on create.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Annotations set on create.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// Detailed runtime status of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    /// Runtime-assigned ID.
    pub id: String,
    /// Name and attempt.
    pub metadata: ContainerMetadata,
    /// Current state.
    pub state: ContainerState,
    /// Creation time (unix seconds).
    #[serde(default)]
    pub created_at: i64,
    /// Start time (unix seconds).
    #[serde(default)]
    pub started_at: i64,
    /// Finish time (unix seconds).
    #[serde(default)]
    pub finished_at: i64,
    /// Exit code of the last run.
    #[serde(default)]
    pub exit_code: i32,
    /// Image the container runs.
    pub image: ImageSpec,
    /// Resolved image ID.
    #[serde(default)]
    pub image_ref: String,
    /// Short reason for the current state.
    #[serde(default)]
    pub reason: String,
    /// Labels set on create.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Annotations set on create.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Mounts as applied by the runtime.
    #[serde(default)]
    pub mounts: Vec<Mount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(state: ContainerState, sandbox: &str) -> Container {
        Container {
            id: "c1".to_string(),
            pod_sandbox_id: sandbox.to_string(),
            state,
            labels: HashMap::from([("io.kubernetes.managed".to_string(), "true".to_string())]),
            ..Container::default()
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ContainerFilter::default();
        assert!(filter.matches(&summary(ContainerState::Exited, "s1")));
    }

    #[test]
    fn filter_by_state_and_sandbox() {
        let filter = ContainerFilter {
            state: Some(ContainerState::Running),
            pod_sandbox_id: Some("s1".to_string()),
            ..ContainerFilter::default()
        };
        assert!(filter.matches(&summary(ContainerState::Running, "s1")));
        assert!(!filter.matches(&summary(ContainerState::Exited, "s1")));
        assert!(!filter.matches(&summary(ContainerState::Running, "s2")));
    }

    #[test]
    fn filter_by_label() {
        let mut filter = ContainerFilter::default();
        filter
            .label_selector
            .insert("io.kubernetes.managed".to_string(), "true".to_string());
        assert!(filter.matches(&summary(ContainerState::Running, "s1")));
        filter
            .label_selector
            .insert("app".to_string(), "web".to_string());
        assert!(!filter.matches(&summary(ContainerState::Running, "s1")));
    }

    #[test]
    fn state_wire_format() {
        assert_eq!(
            serde_json::to_string(&ContainerState::Exited).unwrap(),
            "\"EXITED\""
        );
        assert_eq!(ContainerState::Running.to_string(), "RUNNING");
    }
}
