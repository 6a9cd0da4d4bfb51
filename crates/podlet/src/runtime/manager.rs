//! The runtime manager and its builder.

use std::sync::Arc;

use podlet_api::runtime::ContainerConfig;
use podlet_api::{Container, Pod};
use podlet_common::{ContainerId, PodletError, PodletResult};

use super::builder::ContainerConfigBuilder;
use super::config::RuntimeConfig;
use super::events::{EventBus, EventRecorder, EventType};
use super::hooks::HookRunner;
use super::images::ImagePuller;
use super::options::RunOptionsProvider;
use super::refs::ContainerRefManager;
use super::service::RuntimeService;

/// Drives container lifecycles against a [`RuntimeService`].
///
/// Cheap to clone; clones share collaborators and the reference table.
#[derive(Clone)]
pub struct RuntimeManager {
    pub(super) config: Arc<RuntimeConfig>,
    pub(super) builder: ContainerConfigBuilder,
    pub(super) runtime: Arc<dyn RuntimeService>,
    pub(super) image_puller: Arc<dyn ImagePuller>,
    pub(super) run_options: Arc<dyn RunOptionsProvider>,
    pub(super) runner: Arc<dyn HookRunner>,
    pub(super) recorder: Arc<dyn EventRecorder>,
    pub(super) refs: Arc<ContainerRefManager>,
}

impl std::fmt::Debug for RuntimeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeManager")
            .field("runtime_name", &self.config.runtime_name)
            .field("tracked_refs", &self.refs.len())
            .finish_non_exhaustive()
    }
}

impl RuntimeManager {
    /// Start building a manager.
    #[must_use]
    pub fn builder(config: RuntimeConfig) -> RuntimeManagerBuilder {
        RuntimeManagerBuilder::new(config)
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The container reference table.
    #[must_use]
    pub fn refs(&self) -> &ContainerRefManager {
        &self.refs
    }

    /// Wrap a runtime-assigned ID in a composite ID for this runtime.
    pub(super) fn container_id(&self, raw: impl Into<String>) -> ContainerId {
        ContainerId::new(self.config.runtime_name.clone(), raw)
    }

    /// Record an event against the reference tracked for `id`.
    ///
    /// Dropped with a warning when no reference is tracked.
    pub fn generate_container_event(
        &self,
        id: &ContainerId,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let Some(reference) = self.refs.get_ref(id) else {
            tracing::warn!(container_id = %id, reason, "No reference for container, dropping event");
            return;
        };
        self.recorder.event(&reference, event_type, reason, message);
    }

    /// Resolve run options and build the runtime descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if run options cannot be resolved or the descriptor
    /// cannot be built.
    pub fn generate_container_config(
        &self,
        container: &Container,
        pod: &Pod,
        restart_count: u32,
        pod_ip: &str,
    ) -> PodletResult<ContainerConfig> {
        let opts = self
            .run_options
            .generate_run_container_options(pod, container, pod_ip)?;
        self.builder.build(container, pod, restart_count, &opts)
    }
}

/// Builder for [`RuntimeManager`].
pub struct RuntimeManagerBuilder {
    config: RuntimeConfig,
    runtime: Option<Arc<dyn RuntimeService>>,
    image_puller: Option<Arc<dyn ImagePuller>>,
    run_options: Option<Arc<dyn RunOptionsProvider>>,
    runner: Option<Arc<dyn HookRunner>>,
    recorder: Option<Arc<dyn EventRecorder>>,
}

impl RuntimeManagerBuilder {
    fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            runtime: None,
            image_puller: None,
            run_options: None,
            runner: None,
            recorder: None,
        }
    }

    /// Set the runtime backend.
    #[must_use]
    pub fn runtime(mut self, runtime: Arc<dyn RuntimeService>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Set the image puller.
    #[must_use]
    pub fn image_puller(mut self, puller: Arc<dyn ImagePuller>) -> Self {
        self.image_puller = Some(puller);
        self
    }

    /// Set the run-options provider.
    #[must_use]
    pub fn run_options(mut self, provider: Arc<dyn RunOptionsProvider>) -> Self {
        self.run_options = Some(provider);
        self
    }

    /// Set the lifecycle hook runner.
    #[must_use]
    pub fn hook_runner(mut self, runner: Arc<dyn HookRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Set the event recorder. Defaults to a fresh [`EventBus`].
    #[must_use]
    pub fn event_recorder(mut self, recorder: Arc<dyn EventRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Build the manager.
    ///
    /// # Errors
    ///
    /// Returns [`PodletError::Config`] if a required collaborator is missing.
    pub fn build(self) -> PodletResult<RuntimeManager> {
        let runtime = self.runtime.ok_or_else(|| missing("runtime service"))?;
        let image_puller = self.image_puller.ok_or_else(|| missing("image puller"))?;
        let run_options = self.run_options.ok_or_else(|| missing("run options provider"))?;
        let runner = self.runner.ok_or_else(|| missing("hook runner"))?;
        let recorder = self
            .recorder
            .unwrap_or_else(|| Arc::new(EventBus::new()) as Arc<dyn EventRecorder>);

        tracing::info!(
            runtime = %self.config.runtime_name,
            cpu_cfs_quota = self.config.cpu_cfs_quota,
            "Runtime manager ready"
        );

        Ok(RuntimeManager {
            builder: ContainerConfigBuilder::new(&self.config),
            config: Arc::new(self.config),
            runtime,
            image_puller,
            run_options,
            runner,
            recorder,
            refs: Arc::new(ContainerRefManager::new()),
        })
    }
}

fn missing(what: &str) -> PodletError {
    PodletError::Config {
        message: format!("missing {what}"),
    }
}
