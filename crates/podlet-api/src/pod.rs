//! Declarative pod model.
//!
//! The subset of the pod API the lifecycle core reads: identity, grace
//! periods, per-container image/command/resources, security context and
//! lifecycle hooks.

use std::collections::BTreeMap;

use podlet_common::Quantity;
use serde::{Deserialize, Serialize};

/// A pod: a group of containers sharing one sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    /// Identity and deletion state.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(default)]
    pub spec: PodSpec,
}

impl Pod {
    /// Find a container spec by name (first match wins).
    #[must_use]
    pub fn find_container(&self, name: &str) -> Option<&Container> {
        self.spec.containers.iter().find(|c| c.name == name)
    }

    /// Human-readable `name_namespace(uid)` form used in log lines.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{}_{}({})",
            self.metadata.name, self.metadata.namespace, self.metadata.uid
        )
    }

    /// Returns true if the pod requests SELinux labeling at pod level.
    #[must_use]
    pub fn has_selinux_label(&self) -> bool {
        self.spec
            .security_context
            .as_ref()
            .is_some_and(|ctx| ctx.se_linux_options.is_some())
    }
}

/// Object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name.
    #[serde(default)]
    pub name: String,
    /// Object namespace.
    #[serde(default)]
    pub namespace: String,
    /// Unique object ID.
    #[serde(default)]
    pub uid: String,
    /// Grace period requested when the pod was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_grace_period_seconds: Option<i64>,
}

/// Pod specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Containers in the pod.
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Seconds the pod needs to terminate gracefully.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_grace_period_seconds: Option<i64>,
    /// Pod-level security attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<PodSecurityContext>,
    /// Secrets used to pull images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,
}

/// Reference to an object in the same namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    /// Object name.
    pub name: String,
}

/// A resolved pull secret handed to the image puller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Secret name.
    pub name: String,
    /// Secret payload, keyed by item name.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Pod-level security context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSecurityContext {
    /// SELinux context applied to all containers.
    #[serde(rename = "seLinuxOptions", skip_serializing_if = "Option::is_none")]
    pub se_linux_options: Option<SeLinuxOptions>,
}

/// A single container within a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name, unique within the pod.
    pub name: String,
    /// Image reference.
    #[serde(default)]
    pub image: String,
    /// Entrypoint override.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Arguments to the entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Working directory.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    /// Compute resources.
    #[serde(default)]
    pub resources: ResourceRequirements,
    /// Lifecycle hooks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
    /// Path inside the container the termination message is written to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub termination_message_path: String,
    /// Container-level security attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    /// Keep stdin open.
    #[serde(default)]
    pub stdin: bool,
    /// Close stdin after the first attach disconnects.
    #[serde(default)]
    pub stdin_once: bool,
    /// Allocate a TTY.
    #[serde(default)]
    pub tty: bool,
}

impl Container {
    /// The pre-stop hook, if one is declared.
    #[must_use]
    pub fn pre_stop(&self) -> Option<&Handler> {
        self.lifecycle.as_ref().and_then(|l| l.pre_stop.as_ref())
    }

    /// The post-start hook, if one is declared.
    #[must_use]
    pub fn post_start(&self) -> Option<&Handler> {
        self.lifecycle.as_ref().and_then(|l| l.post_start.as_ref())
    }
}

/// Requests and limits for compute resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// Maximum amounts.
    #[serde(default)]
    pub limits: ResourceList,
    /// Minimum amounts.
    #[serde(default)]
    pub requests: ResourceList,
}

/// CPU and memory amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    /// CPU quantity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Quantity>,
    /// Memory quantity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,
}

impl ResourceList {
    /// CPU quantity, zero if unset.
    #[must_use]
    pub fn cpu(&self) -> Quantity {
        self.cpu.unwrap_or(Quantity::ZERO)
    }

    /// Memory quantity, zero if unset.
    #[must_use]
    pub fn memory(&self) -> Quantity {
        self.memory.unwrap_or(Quantity::ZERO)
    }
}

/// Container-level security context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    /// Run in privileged mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    /// Mount the root filesystem read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_root_filesystem: Option<bool>,
    /// Capabilities to add or drop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    /// SELinux context for this container.
    #[serde(rename = "seLinuxOptions", skip_serializing_if = "Option::is_none")]
    pub se_linux_options: Option<SeLinuxOptions>,
}

/// Linux capability adjustments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Capabilities to add.
    #[serde(default)]
    pub add: Vec<String>,
    /// Capabilities to drop.
    #[serde(default)]
    pub drop: Vec<String>,
}

/// SELinux labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeLinuxOptions {
    /// SELinux user.
    #[serde(default)]
    pub user: String,
    /// SELinux role.
    #[serde(default)]
    pub role: String,
    /// SELinux type.
    #[serde(default, rename = "type")]
    pub type_: String,
    /// SELinux level.
    #[serde(default)]
    pub level: String,
}

/// Lifecycle hooks of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle {
    /// Runs immediately after the container starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_start: Option<Handler>,
    /// Runs immediately before the container is stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_stop: Option<Handler>,
}

/// A lifecycle hook action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Handler {
    /// Run a command inside the container.
    Exec {
        /// Command line to run.
        command: Vec<String>,
    },
    /// Issue an HTTP GET against the container.
    HttpGet {
        /// Request path.
        path: String,
        /// Target port.
        port: u16,
        /// Target host; the pod IP when empty.
        #[serde(default)]
        host: String,
    },
}

/// A resolved environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
}

impl EnvVar {
    /// Create an environment variable.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Options for fetching container logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodLogOptions {
    /// Stream new output.
    #[serde(default)]
    pub follow: bool,
    /// Return logs of the previous instance.
    #[serde(default)]
    pub previous: bool,
    /// Prefix each line with its timestamp.
    #[serde(default)]
    pub timestamps: bool,
    /// Number of lines from the end of the log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail_lines: Option<i64>,
}

/// Reference to an API object, used to attribute events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// Kind of the referent.
    pub kind: String,
    /// Namespace of the referent.
    pub namespace: String,
    /// Name of the referent.
    pub name: String,
    /// UID of the referent.
    pub uid: String,
    /// Path to the sub-object, e.g. `spec.containers{nginx}`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_path: String,
}
