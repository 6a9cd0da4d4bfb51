//! Mount composition.

use podlet_api::Container;
use podlet_api::runtime::Mount;
use podlet_common::id::make_uid;

use super::options::RunContainerOptions;

/// Build the runtime mount list for `container`.
///
/// Volume mounts are copied as resolved; SELinux relabeling is requested only
/// when both the pod and the mount ask for it. When a staging directory is
/// configured and the container declares a termination-message path, an
/// empty file with a random name is created there and mounted at that path.
/// Failing to create the file drops the mount and is otherwise ignored.
#[must_use]
pub fn make_mounts(
    opts: &RunContainerOptions,
    container: &Container,
    pod_has_selinux_label: bool,
) -> Vec<Mount> {
    let mut mounts: Vec<Mount> = opts
        .mounts
        .iter()
        .map(|v| Mount {
            name: v.name.clone(),
            host_path: v.host_path.clone(),
            container_path: v.container_path.clone(),
            readonly: Some(v.read_only),
            selinux_relabel: (pod_has_selinux_label && v.selinux_relabel).then_some(true),
        })
        .collect();

    let termination_dir = opts
        .pod_container_dir
        .as_ref()
        .filter(|_| !container.termination_message_path.is_empty());
    if let Some(dir) = termination_dir {
        let host_path = dir.join(make_uid());
        match std::fs::File::create(&host_path) {
            Ok(_) => {
                tracing::debug!(
                    container = %container.name,
                    path = %host_path.display(),
                    "Created termination-log file"
                );
                mounts.push(Mount {
                    host_path,
                    container_path: container.termination_message_path.clone().into(),
                    ..Mount::default()
                });
            }
            Err(e) => {
                tracing::error!(
                    container = %container.name,
                    path = %host_path.display(),
                    error = %e,
                    "Failed to create termination-log file"
                );
            }
        }
    }

    mounts
}
