//! Standard filesystem paths for podlet.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Default root directory for per-pod container logs.
pub static POD_LOGS_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("PODLET_POD_LOGS_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/log/pods"))
});

/// Standard paths used by the lifecycle core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodletPaths {
    /// Root of the container log tree (default: /var/log/pods).
    pub pod_logs_root: PathBuf,
}

impl PodletPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom log root.
    #[must_use]
    pub fn with_pod_logs_root(root: impl Into<PathBuf>) -> Self {
        Self {
            pod_logs_root: root.into(),
        }
    }

    /// Log directory for one pod.
    #[must_use]
    pub fn pod_logs(&self, pod_uid: &str) -> PathBuf {
        self.pod_logs_root.join(pod_uid)
    }

    /// Log file for one container of a pod: `<root>/<pod uid>/<name>.log`.
    #[must_use]
    pub fn container_log(&self, pod_uid: &str, container_name: &str) -> PathBuf {
        self.pod_logs(pod_uid).join(format!("{container_name}.log"))
    }

    /// The configured log root.
    #[must_use]
    pub fn pod_logs_root(&self) -> &Path {
        &self.pod_logs_root
    }
}

impl Default for PodletPaths {
    fn default() -> Self {
        Self {
            pod_logs_root: POD_LOGS_ROOT.clone(),
        }
    }
}
