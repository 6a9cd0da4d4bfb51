//! Container start and kill flows.
//!
//! Start is a strict sequence (image, config, create, start, post-start
//! hook) that aborts at the first failing stage. Kill races the pre-stop
//! hook against the grace period before asking the runtime to stop the
//! container. Pod-wide kills fan out one task per container.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use podlet_api::pod::{Handler, PodLogOptions, Secret};
use podlet_api::runtime::PodSandboxConfig;
use podlet_api::status::{PodStatus, RunningPod};
use podlet_api::{Container, ObjectReference, Pod};
use podlet_common::{ContainerId, PodletError, PodletResult};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::events::{
    CREATED_CONTAINER, EventType, FAILED_POST_START_HOOK, FAILED_PRE_STOP_HOOK,
    FAILED_TO_CREATE_CONTAINER, FAILED_TO_START_CONTAINER, KILLING_CONTAINER, STARTED_CONTAINER,
};
use super::manager::RuntimeManager;
use super::refs::generate_container_ref;
use super::service::StreamingRuntime;
use super::sync::{SyncAction, SyncError, SyncResult};

/// Shortest grace period a stopping container is given, in seconds.
pub const MINIMUM_GRACE_PERIOD_SECONDS: i64 = 2;

/// Kill reason attached to every container of a pod-wide kill.
pub const POD_KILL_REASON: &str = "Need to kill Pod";

/// Stage of the start flow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartStage {
    /// Ensuring the image is present.
    Image,
    /// Building the runtime descriptor.
    Config,
    /// Creating the container.
    Create,
    /// Starting the container.
    Start,
    /// Running the post-start hook.
    PostStart,
}

impl std::fmt::Display for StartStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Config => write!(f, "config"),
            Self::Create => write!(f, "create"),
            Self::Start => write!(f, "start"),
            Self::PostStart => write!(f, "poststart"),
        }
    }
}

/// A failed start attempt.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{stage}: {message}")]
#[diagnostic(code(podlet::start))]
pub struct StartError {
    /// The stage that failed.
    pub stage: StartStage,
    /// Short human-readable failure message.
    pub message: String,
    /// The underlying error.
    #[source]
    pub source: PodletError,
}

impl StartError {
    fn new(stage: StartStage, message: impl Into<String>, source: PodletError) -> Self {
        Self {
            stage,
            message: message.into(),
            source,
        }
    }
}

/// Grace period before any pre-stop hook runs.
fn base_grace_period(pod: Option<&Pod>) -> i64 {
    pod.and_then(|pod| {
        pod.metadata
            .deletion_grace_period_seconds
            .or(pod.spec.termination_grace_period_seconds)
    })
    .unwrap_or(MINIMUM_GRACE_PERIOD_SECONDS)
}

/// Effective grace period for a stop call.
///
/// The pod's deletion grace period wins over its termination grace period,
/// falling back to [`MINIMUM_GRACE_PERIOD_SECONDS`]. Time spent in the
/// pre-stop hook is subtracted and the result floored at the minimum. An
/// override replaces the result, even below the minimum.
#[must_use]
pub fn resolve_grace_period(
    pod: Option<&Pod>,
    hook_elapsed: Option<i64>,
    grace_period_override: Option<i64>,
) -> i64 {
    if let Some(grace) = grace_period_override {
        return grace;
    }
    let grace = base_grace_period(pod).saturating_sub(hook_elapsed.unwrap_or(0));
    grace.max(MINIMUM_GRACE_PERIOD_SECONDS)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl RuntimeManager {
    fn record(
        &self,
        reference: Option<&ObjectReference>,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        if let Some(reference) = reference {
            self.recorder.event(reference, event_type, reason, message);
        }
    }

    /// Start one container of `pod` inside an existing sandbox.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`StartStage`] with its message and cause.
    /// A failing post-start hook kills the container before returning.
    #[allow(clippy::too_many_arguments)]
    pub async fn start_container(
        &self,
        pod_sandbox_id: &str,
        sandbox_config: &PodSandboxConfig,
        container: &Container,
        pod: &Pod,
        pod_status: &PodStatus,
        pull_secrets: &[Secret],
        pod_ip: &str,
    ) -> Result<(), StartError> {
        self.image_puller
            .ensure_image_exists(pod, container, pull_secrets)
            .await
            .map_err(|e| StartError::new(StartStage::Image, e.message, e.error))?;

        let reference = generate_container_ref(pod, container)
            .inspect_err(|e| {
                tracing::error!(
                    pod = %pod.display_name(),
                    container = %container.name,
                    error = %e,
                    "Can't make a ref to container"
                );
            })
            .ok();

        let restart_count = pod_status
            .find_container_status_by_name(&container.name)
            .map_or(0, |status| status.restart_count.saturating_add(1));

        let config = match self.generate_container_config(container, pod, restart_count, pod_ip) {
            Ok(config) => config,
            Err(e) => {
                self.record(
                    reference.as_ref(),
                    EventType::Warning,
                    FAILED_TO_CREATE_CONTAINER,
                    &format!("Failed to create container with error: {e}"),
                );
                return Err(StartError::new(
                    StartStage::Config,
                    "Generate Container Config Failed",
                    e,
                ));
            }
        };

        let raw_id = match self
            .runtime
            .create_container(pod_sandbox_id, &config, sandbox_config)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.record(
                    reference.as_ref(),
                    EventType::Warning,
                    FAILED_TO_CREATE_CONTAINER,
                    &format!("Failed to create container with error: {e}"),
                );
                return Err(StartError::new(StartStage::Create, "Create Container Failed", e));
            }
        };

        let id = self.container_id(raw_id);
        if let Some(reference) = &reference {
            self.refs.set_ref(id.clone(), reference.clone());
        }
        self.record(
            reference.as_ref(),
            EventType::Normal,
            CREATED_CONTAINER,
            &format!("Created container with id {id}"),
        );
        tracing::info!(container = %container.name, container_id = %id, attempt = restart_count, "Container created");

        if let Err(e) = self.runtime.start_container(&id.id).await {
            self.record(
                reference.as_ref(),
                EventType::Warning,
                FAILED_TO_START_CONTAINER,
                &format!("Failed to start container with id {id} with error: {e}"),
            );
            return Err(StartError::new(StartStage::Start, "Start Container Failed", e));
        }
        self.record(
            reference.as_ref(),
            EventType::Normal,
            STARTED_CONTAINER,
            &format!("Started container with id {id}"),
        );
        tracing::info!(container = %container.name, container_id = %id, "Container started");

        if let Some(handler) = container.post_start() {
            if let Err(hook_err) = self.runner.run(&id, pod, container, handler).await {
                tracing::error!(
                    container = %container.name,
                    container_id = %id,
                    error = %hook_err,
                    "PostStart hook failed"
                );
                self.generate_container_event(
                    &id,
                    EventType::Warning,
                    FAILED_POST_START_HOOK,
                    &hook_err.message,
                );
                if let Err(e) = self
                    .kill_container(Some(pod), &id, Some(container), FAILED_POST_START_HOOK, None)
                    .await
                {
                    tracing::error!(container_id = %id, error = %e, "Failed to kill container after PostStart hook failure");
                }
                return Err(StartError::new(
                    StartStage::PostStart,
                    "PostStart Hook Failed",
                    PodletError::Hook {
                        message: format!("PostStart handler: {}", hook_err.error),
                    },
                ));
            }
        }

        Ok(())
    }

    /// Run the pre-stop hook, waiting at most `grace_period` seconds.
    ///
    /// Returns the whole seconds spent waiting. The hook is never cancelled;
    /// if the wait times out it keeps running in the background.
    async fn execute_pre_stop_hook(
        &self,
        pod: Option<&Pod>,
        id: &ContainerId,
        container: &Container,
        handler: &Handler,
        grace_period: i64,
    ) -> i64 {
        tracing::debug!(container = %container.name, container_id = %id, grace_period, "Running PreStop hook");
        let start = Instant::now();

        let manager = self.clone();
        let runner = Arc::clone(&self.runner);
        let pod = pod.cloned().unwrap_or_default();
        let container = container.clone();
        let handler = handler.clone();
        let hook_id = id.clone();
        let hook = tokio::spawn(async move {
            if let Err(e) = runner.run(&hook_id, &pod, &container, &handler).await {
                tracing::error!(
                    container = %container.name,
                    container_id = %hook_id,
                    error = %e,
                    "PreStop hook failed"
                );
                manager.generate_container_event(
                    &hook_id,
                    EventType::Warning,
                    FAILED_PRE_STOP_HOOK,
                    &e.message,
                );
            }
        });

        let timeout = Duration::from_secs(u64::try_from(grace_period).unwrap_or(0));
        tokio::select! {
            _ = hook => {
                tracing::debug!(container_id = %id, "PreStop hook completed");
            }
            () = tokio::time::sleep(timeout) => {
                tracing::info!(container_id = %id, grace_period, "PreStop hook not completed in grace period");
            }
        }

        i64::try_from(start.elapsed().as_secs()).unwrap_or(i64::MAX)
    }

    /// Stop one container.
    ///
    /// Runs the pre-stop hook when `spec` declares one, then stops the
    /// container with the resolved grace period. A kill event is recorded and
    /// the container's reference is cleared whether or not the stop succeeds.
    ///
    /// # Errors
    ///
    /// Returns the runtime's stop error.
    pub async fn kill_container(
        &self,
        pod: Option<&Pod>,
        id: &ContainerId,
        spec: Option<&Container>,
        reason: &str,
        grace_period_override: Option<i64>,
    ) -> PodletResult<()> {
        let hook_elapsed = match spec.and_then(|c| c.pre_stop().map(|h| (c, h))) {
            Some((container, handler)) => Some(
                self.execute_pre_stop_hook(pod, id, container, handler, base_grace_period(pod))
                    .await,
            ),
            None => None,
        };
        let grace_period = resolve_grace_period(pod, hook_elapsed, grace_period_override);

        tracing::info!(container_id = %id, grace_period, reason, "Killing container");
        let result = self
            .runtime
            .stop_container(&id.id, grace_period)
            .await
            .inspect_err(|e| {
                tracing::error!(container_id = %id, error = %e, "StopContainer failed");
            });

        let mut message = format!("Killing container with id {id}");
        if !reason.is_empty() {
            message.push(':');
            message.push_str(reason);
        }
        self.generate_container_event(id, EventType::Normal, KILLING_CONTAINER, &message);
        self.refs.clear_ref(id);

        result
    }

    /// Kill every running container of a pod concurrently.
    ///
    /// Returns one [`SyncResult`] per container in completion order. A
    /// failing or panicking kill only affects its own result.
    pub async fn kill_containers_with_sync_result(
        &self,
        pod: Option<&Pod>,
        running_pod: &RunningPod,
        grace_period_override: Option<i64>,
    ) -> Vec<SyncResult> {
        let count = running_pod.containers.len();
        let (tx, mut rx) = mpsc::channel(count.max(1));

        for container in &running_pod.containers {
            let tx = tx.clone();
            let manager = self.clone();
            let pod = pod.cloned();
            let spec = pod
                .as_ref()
                .and_then(|p| p.find_container(&container.name))
                .cloned();
            let id = container.id.clone();
            let name = container.name.clone();

            tokio::spawn(async move {
                let mut result = SyncResult::new(SyncAction::KillContainer, name);
                let kill = manager.kill_container(
                    pod.as_ref(),
                    &id,
                    spec.as_ref(),
                    POD_KILL_REASON,
                    grace_period_override,
                );
                match AssertUnwindSafe(kill).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => result.fail(SyncError::KillContainer, e.to_string()),
                    Err(payload) => {
                        let detail = panic_message(payload.as_ref());
                        tracing::error!(container_id = %id, panic = %detail, "Kill task panicked");
                        result.fail(SyncError::KillContainer, format!("panic: {detail}"));
                    }
                }
                // Receiver outlives every sender
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(count);
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    }

    /// Remove a container from the runtime.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error.
    pub async fn delete_container(&self, id: &ContainerId) -> PodletResult<()> {
        tracing::info!(container_id = %id, "Removing container");
        self.runtime.remove_container(&id.id).await
    }

    /// Attach to a running container. Not supported by any backend.
    ///
    /// # Errors
    ///
    /// Always returns [`PodletError::Unsupported`].
    pub fn attach_container(&self, id: &ContainerId) -> PodletResult<()> {
        tracing::debug!(container_id = %id, runtime = %self.config.runtime_name, "Attach requested");
        Err(PodletError::Unsupported {
            feature: "attach".to_string(),
        })
    }

    fn streaming(&self, feature: &str) -> PodletResult<&dyn StreamingRuntime> {
        self.runtime.streaming().ok_or_else(|| PodletError::Unsupported {
            feature: feature.to_string(),
        })
    }

    /// Copy a container's logs to the given writers.
    ///
    /// # Errors
    ///
    /// Returns [`PodletError::Unsupported`] when the backend cannot stream
    /// logs, otherwise the backend's error.
    pub async fn get_container_logs(
        &self,
        pod: &Pod,
        id: &ContainerId,
        options: &PodLogOptions,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> PodletResult<()> {
        self.streaming("container logs")?
            .container_logs(pod, id, options, stdout, stderr)
            .await
    }

    /// Run a command inside a container.
    ///
    /// # Errors
    ///
    /// Returns [`PodletError::Unsupported`] when the backend cannot exec,
    /// otherwise the backend's error.
    pub async fn exec_in_container(
        &self,
        id: &ContainerId,
        cmd: &[String],
        stdin: Option<&mut (dyn AsyncRead + Send + Unpin)>,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
        tty: bool,
    ) -> PodletResult<()> {
        self.streaming("exec")?
            .exec_in_container(id, cmd, stdin, stdout, stderr, tty)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pod(deletion: Option<i64>, termination: Option<i64>) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.deletion_grace_period_seconds = deletion;
        pod.spec.termination_grace_period_seconds = termination;
        pod
    }

    #[test]
    fn stage_labels() {
        let labels: Vec<String> = [
            StartStage::Image,
            StartStage::Config,
            StartStage::Create,
            StartStage::Start,
            StartStage::PostStart,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(labels, ["image", "config", "create", "start", "poststart"]);
    }

    #[test]
    fn start_error_display() {
        let err = StartError::new(
            StartStage::Create,
            "Create Container Failed",
            PodletError::runtime("create", "no space left"),
        );
        insta::assert_snapshot!(err.to_string(), @"create: Create Container Failed");
    }

    #[test]
    fn grace_period_precedence() {
        assert_eq!(resolve_grace_period(None, None, None), MINIMUM_GRACE_PERIOD_SECONDS);
        assert_eq!(resolve_grace_period(Some(&pod(None, Some(30))), None, None), 30);
        assert_eq!(resolve_grace_period(Some(&pod(Some(10), Some(30))), None, None), 10);
        assert_eq!(resolve_grace_period(Some(&pod(None, None)), None, None), 2);
    }

    #[test]
    fn hook_time_is_subtracted_and_floored() {
        let p = pod(None, Some(30));
        assert_eq!(resolve_grace_period(Some(&p), Some(10), None), 20);
        assert_eq!(resolve_grace_period(Some(&p), Some(29), None), 2);
        assert_eq!(resolve_grace_period(Some(&p), Some(100), None), 2);
    }

    #[test]
    fn override_wins_even_below_minimum() {
        let p = pod(Some(60), Some(30));
        assert_eq!(resolve_grace_period(Some(&p), Some(5), Some(0)), 0);
        assert_eq!(resolve_grace_period(None, None, Some(120)), 120);
    }

    #[test]
    fn panic_payloads() {
        let static_str: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(static_str.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    proptest! {
        #[test]
        fn grace_period_never_below_minimum(
            deletion in proptest::option::of(-100i64..10_000),
            termination in proptest::option::of(-100i64..10_000),
            elapsed in proptest::option::of(0i64..20_000),
        ) {
            let p = pod(deletion, termination);
            prop_assert!(resolve_grace_period(Some(&p), elapsed, None) >= MINIMUM_GRACE_PERIOD_SECONDS);
        }

        #[test]
        fn override_is_exact(
            deletion in proptest::option::of(0i64..10_000),
            elapsed in proptest::option::of(0i64..20_000),
            grace in -10i64..10_000,
        ) {
            let p = pod(deletion, None);
            prop_assert_eq!(resolve_grace_period(Some(&p), elapsed, Some(grace)), grace);
        }
    }
}
