//! Label and annotation codec.
//!
//! Labels carry identity the runtime may filter on; annotations carry
//! opaque bookkeeping read back when reconstructing status. Decoding is
//! tolerant: missing or malformed values decode to their zero value.

use std::collections::HashMap;

use podlet_api::{Container, Pod};
use podlet_common::PodletResult;

use super::builder::hash_container;

/// Marks containers created by this agent.
pub const KUBERNETES_MANAGED_LABEL: &str = "io.kubernetes.managed";
/// Pod name label.
pub const POD_NAME_LABEL: &str = "io.kubernetes.pod.name";
/// Pod namespace label.
pub const POD_NAMESPACE_LABEL: &str = "io.kubernetes.pod.namespace";
/// Pod UID label.
pub const POD_UID_LABEL: &str = "io.kubernetes.pod.uid";
/// Container name label.
pub const CONTAINER_NAME_LABEL: &str = "io.kubernetes.container.name";

/// Container spec hash annotation (hex).
pub const CONTAINER_HASH_ANNOTATION: &str = "io.kubernetes.container.hash";
/// Restart count annotation (decimal).
pub const CONTAINER_RESTART_COUNT_ANNOTATION: &str = "io.kubernetes.container.restartCount";
/// Termination message path annotation.
pub const CONTAINER_TERMINATION_MESSAGE_PATH_ANNOTATION: &str =
    "io.kubernetes.container.terminationMessagePath";

/// Identity recovered from container labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledContainerInfo {
    /// Pod name.
    pub pod_name: String,
    /// Pod namespace.
    pub pod_namespace: String,
    /// Pod UID.
    pub pod_uid: String,
    /// Container name.
    pub container_name: String,
}

/// Bookkeeping recovered from container annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedContainerInfo {
    /// Spec hash.
    pub hash: u64,
    /// Restart count.
    pub restart_count: u32,
    /// Termination message path, empty if none was declared.
    pub termination_message_path: String,
}

/// Labels set on every container created for `pod`.
#[must_use]
pub fn new_container_labels(container: &Container, pod: &Pod) -> HashMap<String, String> {
    HashMap::from([
        (KUBERNETES_MANAGED_LABEL.to_string(), "true".to_string()),
        (POD_NAME_LABEL.to_string(), pod.metadata.name.clone()),
        (POD_NAMESPACE_LABEL.to_string(), pod.metadata.namespace.clone()),
        (POD_UID_LABEL.to_string(), pod.metadata.uid.clone()),
        (CONTAINER_NAME_LABEL.to_string(), container.name.clone()),
    ])
}

/// Annotations set on a container instance.
///
/// # Errors
///
/// Returns an error if the container spec cannot be hashed.
pub fn new_container_annotations(
    container: &Container,
    restart_count: u32,
) -> PodletResult<HashMap<String, String>> {
    let mut annotations = HashMap::from([
        (
            CONTAINER_HASH_ANNOTATION.to_string(),
            format!("{:x}", hash_container(container)?),
        ),
        (
            CONTAINER_RESTART_COUNT_ANNOTATION.to_string(),
            restart_count.to_string(),
        ),
    ]);
    if !container.termination_message_path.is_empty() {
        annotations.insert(
            CONTAINER_TERMINATION_MESSAGE_PATH_ANNOTATION.to_string(),
            container.termination_message_path.clone(),
        );
    }
    Ok(annotations)
}

/// Decode identity labels.
#[must_use]
pub fn get_container_info_from_labels(labels: &HashMap<String, String>) -> LabeledContainerInfo {
    let get = |key: &str| labels.get(key).cloned().unwrap_or_default();
    LabeledContainerInfo {
        pod_name: get(POD_NAME_LABEL),
        pod_namespace: get(POD_NAMESPACE_LABEL),
        pod_uid: get(POD_UID_LABEL),
        container_name: get(CONTAINER_NAME_LABEL),
    }
}

/// Decode bookkeeping annotations.
#[must_use]
pub fn get_container_info_from_annotations(
    annotations: &HashMap<String, String>,
) -> AnnotatedContainerInfo {
    let hash = annotations
        .get(CONTAINER_HASH_ANNOTATION)
        .and_then(|v| {
            u64::from_str_radix(v, 16)
                .inspect_err(|e| {
                    tracing::warn!(value = %v, error = %e, "Unable to decode container hash");
                })
                .ok()
        })
        .unwrap_or_default();
    let restart_count = annotations
        .get(CONTAINER_RESTART_COUNT_ANNOTATION)
        .and_then(|v| {
            v.parse::<u32>()
                .inspect_err(|e| {
                    tracing::warn!(value = %v, error = %e, "Unable to decode restart count");
                })
                .ok()
        })
        .unwrap_or_default();

    AnnotatedContainerInfo {
        hash,
        restart_count,
        termination_message_path: annotations
            .get(CONTAINER_TERMINATION_MESSAGE_PATH_ANNOTATION)
            .cloned()
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod_and_container() -> (Pod, Container) {
        let container = Container {
            name: "app".to_string(),
            image: "busybox".to_string(),
            termination_message_path: "/dev/termination-log".to_string(),
            ..Container::default()
        };
        let mut pod = Pod::default();
        pod.metadata.name = "web".to_string();
        pod.metadata.namespace = "prod".to_string();
        pod.metadata.uid = "u-42".to_string();
        pod.spec.containers.push(container.clone());
        (pod, container)
    }

    #[test]
    fn labels_identify_container() {
        let (pod, container) = pod_and_container();
        let labels = new_container_labels(&container, &pod);
        assert_eq!(labels[KUBERNETES_MANAGED_LABEL], "true");

        let info = get_container_info_from_labels(&labels);
        assert_eq!(info.pod_name, "web");
        assert_eq!(info.pod_namespace, "prod");
        assert_eq!(info.pod_uid, "u-42");
        assert_eq!(info.container_name, "app");
    }

    #[test]
    fn annotations_carry_bookkeeping() {
        let (_, container) = pod_and_container();
        let annotations = new_container_annotations(&container, 3).unwrap();

        let info = get_container_info_from_annotations(&annotations);
        assert_eq!(info.hash, hash_container(&container).unwrap());
        assert_eq!(info.restart_count, 3);
        assert_eq!(info.termination_message_path, "/dev/termination-log");
    }

    #[test]
    fn no_termination_path_annotation_when_undeclared() {
        let (_, mut container) = pod_and_container();
        container.termination_message_path.clear();
        let annotations = new_container_annotations(&container, 0).unwrap();
        assert!(!annotations.contains_key(CONTAINER_TERMINATION_MESSAGE_PATH_ANNOTATION));
    }

    #[test]
    fn malformed_annotations_decode_to_zero() {
        let annotations = HashMap::from([
            (CONTAINER_HASH_ANNOTATION.to_string(), "not-hex".to_string()),
            (CONTAINER_RESTART_COUNT_ANNOTATION.to_string(), "-1".to_string()),
        ]);
        let info = get_container_info_from_annotations(&annotations);
        assert_eq!(info, AnnotatedContainerInfo::default());
    }
}
