//! Shared fakes for the runtime manager integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use podlet::runtime::{
    EnsureImageError, EventBus, HookError, HookRunner, ImagePuller, RecordedEvent,
    RunContainerOptions, RunOptionsProvider, RuntimeConfig, RuntimeManager, RuntimeService,
    StreamingRuntime,
};
use podlet_api::pod::{EnvVar, Handler, Lifecycle, PodLogOptions, Secret};
use podlet_api::runtime::{
    Container as RuntimeContainer, ContainerConfig, ContainerFilter, ContainerStatus,
    PodSandboxConfig,
};
use podlet_api::{Container, Pod};
use podlet_common::{ContainerId, PodletError, PodletResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;

/// In-memory runtime recording every call it receives.
#[derive(Default)]
pub struct FakeRuntime {
    pub create_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_list: AtomicBool,
    /// Raw IDs whose stop call fails.
    pub fail_stop: Mutex<HashSet<String>>,
    /// Raw IDs whose stop call panics.
    pub panic_stop: Mutex<HashSet<String>>,
    /// `(raw id, timeout)` of every stop call.
    pub stops: Mutex<Vec<(String, i64)>>,
    pub created: Mutex<Vec<ContainerConfig>>,
    pub containers: Mutex<Vec<RuntimeContainer>>,
    pub statuses: Mutex<HashMap<String, ContainerStatus>>,
    /// Whether the log/exec capability is offered.
    pub streaming: bool,
    pub next_id: AtomicUsize,
}

impl FakeRuntime {
    pub fn stop_timeouts(&self) -> Vec<i64> {
        self.stops.lock().iter().map(|(_, t)| *t).collect()
    }

    pub fn add_container(&self, container: RuntimeContainer, status: ContainerStatus) {
        self.statuses.lock().insert(container.id.clone(), status);
        self.containers.lock().push(container);
    }
}

#[async_trait]
impl RuntimeService for FakeRuntime {
    async fn create_container(
        &self,
        _pod_sandbox_id: &str,
        config: &ContainerConfig,
        _sandbox_config: &PodSandboxConfig,
    ) -> PodletResult<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(PodletError::runtime("create", "no space left on device"));
        }
        self.created.lock().push(config.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("c{n}"))
    }

    async fn start_container(&self, _id: &str) -> PodletResult<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(PodletError::runtime("start", "exec format error"));
        }
        Ok(())
    }

    async fn stop_container(&self, id: &str, timeout: i64) -> PodletResult<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stops.lock().push((id.to_string(), timeout));
        let should_panic = self.panic_stop.lock().contains(id);
        assert!(!should_panic, "runtime crashed stopping {id}");
        if self.fail_stop.lock().contains(id) {
            return Err(PodletError::runtime("stop", format!("container {id} is stuck")));
        }
        Ok(())
    }

    async fn remove_container(&self, _id: &str) -> PodletResult<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_containers(&self, filter: &ContainerFilter) -> PodletResult<Vec<RuntimeContainer>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(PodletError::runtime("list", "connection refused"));
        }
        Ok(self
            .containers
            .lock()
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn container_status(&self, id: &str) -> PodletResult<ContainerStatus> {
        self.statuses
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| PodletError::ContainerNotFound { name: id.to_string() })
    }

    fn streaming(&self) -> Option<&dyn StreamingRuntime> {
        self.streaming.then_some(self as &dyn StreamingRuntime)
    }
}

#[async_trait]
impl StreamingRuntime for FakeRuntime {
    async fn container_logs(
        &self,
        _pod: &Pod,
        id: &ContainerId,
        options: &PodLogOptions,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        stderr: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> PodletResult<()> {
        let tail = options.tail_lines.unwrap_or(-1);
        stdout.write_all(format!("logs of {id} tail={tail}\n").as_bytes()).await?;
        stderr.write_all(b"no errors\n").await?;
        Ok(())
    }

    async fn exec_in_container(
        &self,
        _id: &ContainerId,
        cmd: &[String],
        stdin: Option<&mut (dyn AsyncRead + Send + Unpin)>,
        stdout: &mut (dyn AsyncWrite + Send + Unpin),
        _stderr: &mut (dyn AsyncWrite + Send + Unpin),
        _tty: bool,
    ) -> PodletResult<()> {
        let mut input = String::new();
        if let Some(stdin) = stdin {
            stdin.read_to_string(&mut input).await?;
        }
        stdout
            .write_all(format!("{} <{input}>", cmd.join(" ")).as_bytes())
            .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeImagePuller {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImagePuller for FakeImagePuller {
    async fn ensure_image_exists(
        &self,
        _pod: &Pod,
        container: &Container,
        _pull_secrets: &[Secret],
    ) -> Result<(), EnsureImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EnsureImageError::new(
                "ErrImagePull",
                PodletError::ImagePull {
                    image: container.image.clone(),
                    message: "manifest unknown".to_string(),
                },
            ));
        }
        Ok(())
    }
}

/// Hook runner that sleeps for `delay` and then succeeds or fails.
#[derive(Default)]
pub struct FakeHookRunner {
    pub delay: Mutex<Duration>,
    pub fail: AtomicBool,
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
}

impl FakeHookRunner {
    pub fn with_delay(delay: Duration) -> Self {
        let runner = Self::default();
        *runner.delay.lock() = delay;
        runner
    }
}

#[async_trait]
impl HookRunner for FakeHookRunner {
    async fn run(
        &self,
        _container_id: &ContainerId,
        _pod: &Pod,
        _container: &Container,
        _handler: &Handler,
    ) -> Result<String, HookError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(HookError::new(
                "sh: /hooks/drain.sh: not found",
                PodletError::Hook {
                    message: "command exited with 1".to_string(),
                },
            ));
        }
        Ok(String::new())
    }
}

#[derive(Default)]
pub struct FakeOptions {
    pub fail: AtomicBool,
    pub pod_container_dir: Option<PathBuf>,
}

impl RunOptionsProvider for FakeOptions {
    fn generate_run_container_options(
        &self,
        _pod: &Pod,
        _container: &Container,
        pod_ip: &str,
    ) -> PodletResult<RunContainerOptions> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PodletError::Config {
                message: "secret \"db-creds\" not found".to_string(),
            });
        }
        Ok(RunContainerOptions {
            envs: vec![EnvVar::new("POD_IP", pod_ip)],
            mounts: Vec::new(),
            pod_container_dir: self.pod_container_dir.clone(),
        })
    }
}

/// A manager wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub manager: RuntimeManager,
    pub runtime: Arc<FakeRuntime>,
    pub images: Arc<FakeImagePuller>,
    pub hooks: Arc<FakeHookRunner>,
    pub options: Arc<FakeOptions>,
    pub events: broadcast::Receiver<RecordedEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeRuntime::default(), FakeHookRunner::default(), FakeOptions::default())
    }

    pub fn with(runtime: FakeRuntime, hooks: FakeHookRunner, options: FakeOptions) -> Self {
        let runtime = Arc::new(runtime);
        let images = Arc::new(FakeImagePuller::default());
        let hooks = Arc::new(hooks);
        let options = Arc::new(options);
        let bus = EventBus::new();
        let events = bus.subscribe();

        let manager = RuntimeManager::builder(RuntimeConfig::default())
            .runtime(runtime.clone())
            .image_puller(images.clone())
            .run_options(options.clone())
            .hook_runner(hooks.clone())
            .event_recorder(Arc::new(bus))
            .build()
            .expect("all collaborators are set");

        Self {
            manager,
            runtime,
            images,
            hooks,
            options,
            events,
        }
    }

    /// Drain the events recorded so far.
    pub fn drain_events(&mut self) -> Vec<RecordedEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn event_reasons(&mut self) -> Vec<String> {
        self.drain_events().into_iter().map(|e| e.reason).collect()
    }
}

pub fn exec_hook() -> Handler {
    Handler::Exec {
        command: vec!["/bin/sh".to_string(), "-c".to_string(), "sleep 1".to_string()],
    }
}

pub fn container(name: &str) -> Container {
    Container {
        name: name.to_string(),
        image: format!("registry.example.com/{name}:1.0"),
        ..Container::default()
    }
}

pub fn with_pre_stop(mut container: Container) -> Container {
    container.lifecycle = Some(Lifecycle {
        pre_stop: Some(exec_hook()),
        ..container.lifecycle.unwrap_or_default()
    });
    container
}

pub fn with_post_start(mut container: Container) -> Container {
    container.lifecycle = Some(Lifecycle {
        post_start: Some(exec_hook()),
        ..container.lifecycle.unwrap_or_default()
    });
    container
}

pub fn pod(containers: Vec<Container>) -> Pod {
    let mut pod = Pod::default();
    pod.metadata.name = "web".to_string();
    pod.metadata.namespace = "default".to_string();
    pod.metadata.uid = "5f1e3c2a-uid".to_string();
    pod.spec.containers = containers;
    pod
}

pub fn sandbox_config() -> PodSandboxConfig {
    PodSandboxConfig {
        name: "web".to_string(),
        namespace: "default".to_string(),
        uid: "5f1e3c2a-uid".to_string(),
        ..PodSandboxConfig::default()
    }
}
