//! Resolved run options and command expansion.

use std::collections::HashMap;
use std::path::PathBuf;

use podlet_api::pod::EnvVar;
use podlet_api::{Container, Pod};
use podlet_common::PodletResult;

/// A volume mount resolved to a host path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeMount {
    /// Volume name.
    pub name: String,
    /// Path on the host.
    pub host_path: PathBuf,
    /// Path inside the container.
    pub container_path: PathBuf,
    /// Mount read-only.
    pub read_only: bool,
    /// Relabel for SELinux, honoured only when the pod carries a label.
    pub selinux_relabel: bool,
}

/// Everything resolved outside the core that a descriptor needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContainerOptions {
    /// Expanded environment, in order.
    pub envs: Vec<EnvVar>,
    /// Volume mounts.
    pub mounts: Vec<VolumeMount>,
    /// Per-container staging directory for the termination-message file.
    pub pod_container_dir: Option<PathBuf>,
}

/// Resolves environment and volumes for a container.
pub trait RunOptionsProvider: Send + Sync {
    /// Generate the run options for `container` of `pod`.
    ///
    /// # Errors
    ///
    /// Returns an error if env or volume resolution fails.
    fn generate_run_container_options(
        &self,
        pod: &Pod,
        container: &Container,
        pod_ip: &str,
    ) -> PodletResult<RunContainerOptions>;
}

/// Expand `$(VAR)` references in a container's command and args.
#[must_use]
pub fn expand_container_command_and_args(
    container: &Container,
    envs: &[EnvVar],
) -> (Vec<String>, Vec<String>) {
    let mapping: HashMap<&str, &str> = envs
        .iter()
        .map(|e| (e.name.as_str(), e.value.as_str()))
        .collect();
    let expand_all = |items: &[String]| -> Vec<String> {
        items.iter().map(|item| expand(item, &mapping)).collect()
    };
    (expand_all(&container.command), expand_all(&container.args))
}

/// `$(NAME)` is replaced when NAME is defined, `$$` becomes `$`, and
/// anything else is copied through untouched.
fn expand(input: &str, mapping: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(body) = after.strip_prefix('(') {
            match body.find(')') {
                Some(end) => {
                    let name = &body[..end];
                    match mapping.get(name) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push_str("$(");
                            out.push_str(name);
                            out.push(')');
                        }
                    }
                    rest = &body[end + 1..];
                }
                None => {
                    out.push_str(&rest[pos..]);
                    rest = "";
                }
            }
        } else {
            out.push('$');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}
