//! Runtime descriptor construction.

use podlet_api::runtime::{
    Capability, ContainerConfig, ContainerMetadata, ImageSpec, KeyValue, LinuxContainerConfig,
    LinuxContainerResources, SeLinuxOption,
};
use podlet_api::{Container, Pod};
use podlet_common::{PodletPaths, PodletResult};
use sha2::{Digest, Sha256};

use super::config::RuntimeConfig;
use super::labels::{new_container_annotations, new_container_labels};
use super::mounts::make_mounts;
use super::options::{RunContainerOptions, expand_container_command_and_args};
use super::resources::{milli_cpu_to_quota, milli_cpu_to_shares};

/// Stable content hash of a container spec.
///
/// SHA-256 over the spec's JSON form, truncated to the first 8 bytes.
///
/// # Errors
///
/// Returns an error if the spec cannot be serialized.
pub fn hash_container(container: &Container) -> PodletResult<u64> {
    let json = serde_json::to_vec(container)?;
    let digest = Sha256::digest(&json);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    Ok(u64::from_be_bytes(head))
}

/// Builds the descriptor handed to the runtime on create.
#[derive(Debug, Clone)]
pub struct ContainerConfigBuilder {
    cpu_cfs_quota: bool,
    paths: PodletPaths,
}

impl ContainerConfigBuilder {
    /// Create a builder from the runtime configuration.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            cpu_cfs_quota: config.cpu_cfs_quota,
            paths: config.paths.clone(),
        }
    }

    /// Build the descriptor for one start attempt of `container`.
    ///
    /// `restart_count` becomes the metadata attempt. Creates the
    /// termination-message file when one is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the container spec cannot be hashed for its
    /// annotations.
    pub fn build(
        &self,
        container: &Container,
        pod: &Pod,
        restart_count: u32,
        opts: &RunContainerOptions,
    ) -> PodletResult<ContainerConfig> {
        let (command, args) = expand_container_command_and_args(container, &opts.envs);

        let mut config = ContainerConfig {
            metadata: ContainerMetadata {
                name: container.name.clone(),
                attempt: restart_count,
            },
            image: ImageSpec {
                image: container.image.clone(),
            },
            command,
            args,
            working_dir: container.working_dir.clone(),
            envs: opts
                .envs
                .iter()
                .map(|e| KeyValue {
                    key: e.name.clone(),
                    value: e.value.clone(),
                })
                .collect(),
            mounts: make_mounts(opts, container, pod.has_selinux_label()),
            labels: new_container_labels(container, pod),
            annotations: new_container_annotations(container, restart_count)?,
            log_path: self.paths.container_log(&pod.metadata.uid, &container.name),
            stdin: container.stdin,
            stdin_once: container.stdin_once,
            tty: container.tty,
            privileged: None,
            readonly_rootfs: None,
            linux: self.linux_container_config(container),
        };

        if let Some(ctx) = &container.security_context {
            config.privileged = ctx.privileged;
            config.readonly_rootfs = ctx.read_only_root_filesystem;
        }

        tracing::debug!(
            container = %container.name,
            attempt = restart_count,
            mounts = config.mounts.len(),
            "Generated container config"
        );

        Ok(config)
    }

    /// Linux resources and security options for `container`.
    #[must_use]
    pub fn linux_container_config(&self, container: &Container) -> LinuxContainerConfig {
        let cpu_request = container.resources.requests.cpu();
        let cpu_limit = container.resources.limits.cpu();
        let memory_limit = container.resources.limits.memory().value();

        // An unset request defaults to the limit
        let cpu_shares = if cpu_request.is_zero() && !cpu_limit.is_zero() {
            milli_cpu_to_shares(cpu_limit.milli_value())
        } else {
            milli_cpu_to_shares(cpu_request.milli_value())
        };

        let mut resources = LinuxContainerResources {
            cpu_shares,
            memory_limit_in_bytes: (memory_limit != 0).then_some(memory_limit),
            ..LinuxContainerResources::default()
        };
        if self.cpu_cfs_quota {
            let (quota, period) = milli_cpu_to_quota(cpu_limit.milli_value());
            resources.cpu_quota = Some(quota);
            resources.cpu_period = Some(period);
        }

        let mut linux = LinuxContainerConfig {
            resources,
            ..LinuxContainerConfig::default()
        };

        if let Some(ctx) = &container.security_context {
            linux.capabilities = ctx.capabilities.as_ref().map(|caps| Capability {
                add_capabilities: caps.add.clone(),
                drop_capabilities: caps.drop.clone(),
            });
            linux.selinux_options = ctx.se_linux_options.as_ref().map(|opts| SeLinuxOption {
                user: opts.user.clone(),
                role: opts.role.clone(),
                type_: opts.type_.clone(),
                level: opts.level.clone(),
            });
        }

        linux
    }
}
