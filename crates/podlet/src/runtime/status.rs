//! Container status assembly.
//!
//! Runtime reports are merged with the label and annotation encodings written
//! at create time. Nothing here is cached; every query goes to the runtime.

use std::path::Path;

use chrono::{DateTime, Utc};
use podlet_api::runtime::{self as runtime_api, ContainerFilter, ContainerState};
use podlet_api::status::{ContainerStatus, KubeContainerState};
use podlet_common::PodletResult;

use super::labels::{
    KUBERNETES_MANAGED_LABEL, get_container_info_from_annotations, get_container_info_from_labels,
};
use super::manager::RuntimeManager;

/// Unix seconds to a timestamp; `0` means unset.
fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        None
    } else {
        DateTime::from_timestamp(secs, 0)
    }
}

/// Recover the termination message of a finished container.
///
/// Reads the host file behind the mount whose container path is `path`.
/// Returns an empty string for live containers, when `path` is empty, or
/// when no mount matches. A read failure is reported inline.
#[must_use]
pub fn get_termination_message(
    status: &runtime_api::ContainerStatus,
    kube_status: &ContainerStatus,
    path: &str,
) -> String {
    if path.is_empty() || kube_status.is_live() {
        return String::new();
    }

    let target = Path::new(path);
    let Some(mount) = status.mounts.iter().find(|m| m.container_path == target) else {
        return String::new();
    };

    match std::fs::read(&mount.host_path) {
        Ok(data) => String::from_utf8_lossy(&data).into_owned(),
        Err(e) => {
            tracing::debug!(
                container_id = %status.id,
                host_path = %mount.host_path.display(),
                error = %e,
                "Unable to read termination log"
            );
            format!(
                "Error on reading termination-log {}: {e}",
                mount.host_path.display()
            )
        }
    }
}

impl RuntimeManager {
    /// Statuses of every container in a sandbox, oldest first.
    ///
    /// # Errors
    ///
    /// Fails as a whole if listing or any per-container status call fails.
    pub async fn get_kubelet_container_statuses(
        &self,
        pod_sandbox_id: &str,
    ) -> PodletResult<Vec<ContainerStatus>> {
        let filter = ContainerFilter {
            pod_sandbox_id: Some(pod_sandbox_id.to_string()),
            ..ContainerFilter::default()
        };
        let containers = self.runtime.list_containers(&filter).await.inspect_err(|e| {
            tracing::error!(pod_sandbox_id, error = %e, "ListContainers failed");
        })?;

        let mut statuses = Vec::with_capacity(containers.len());
        for c in &containers {
            let status = self.runtime.container_status(&c.id).await.inspect_err(|e| {
                tracing::error!(container_id = %c.id, error = %e, "ContainerStatus failed");
            })?;
            statuses.push(self.to_kube_container_status(&status));
        }

        statuses.sort_by_key(|s| s.created_at);
        Ok(statuses)
    }

    /// Containers created by this agent; only running ones unless `all`.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if listing fails.
    pub async fn get_kubelet_containers(
        &self,
        all: bool,
    ) -> PodletResult<Vec<runtime_api::Container>> {
        let filter = ContainerFilter {
            state: (!all).then_some(ContainerState::Running),
            label_selector: [(KUBERNETES_MANAGED_LABEL.to_string(), "true".to_string())]
                .into_iter()
                .collect(),
            ..ContainerFilter::default()
        };
        self.runtime.list_containers(&filter).await.inspect_err(|e| {
            tracing::error!(error = %e, "ListContainers failed");
        })
    }

    fn to_kube_container_status(&self, status: &runtime_api::ContainerStatus) -> ContainerStatus {
        let labeled = get_container_info_from_labels(&status.labels);
        let annotated = get_container_info_from_annotations(&status.annotations);
        let name = if labeled.container_name.is_empty() {
            status.metadata.name.clone()
        } else {
            labeled.container_name
        };

        let mut kube = ContainerStatus {
            id: self.container_id(status.id.clone()),
            name,
            state: KubeContainerState::from(status.state),
            created_at: timestamp(status.created_at).unwrap_or_default(),
            started_at: None,
            finished_at: None,
            exit_code: 0,
            image: status.image.image.clone(),
            image_id: status.image_ref.clone(),
            hash: annotated.hash,
            restart_count: annotated.restart_count,
            reason: String::new(),
            message: String::new(),
        };

        if status.state == ContainerState::Running {
            kube.started_at = timestamp(status.started_at);
        } else {
            kube.reason.clone_from(&status.reason);
            kube.exit_code = status.exit_code;
            kube.finished_at = timestamp(status.finished_at);
        }

        kube.message = get_termination_message(status, &kube, &annotated.termination_message_path);
        kube
    }
}
