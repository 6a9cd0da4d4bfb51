//! Container lifecycle core.
//!
//! This module provides the [`RuntimeManager`] and the pieces it is built
//! from: resource translation, descriptor building, mount composition,
//! status assembly and the collaborator contracts it drives.

mod builder;
mod config;
pub mod events;
mod hooks;
mod images;
pub mod labels;
mod lifecycle;
mod manager;
mod mounts;
mod options;
mod refs;
pub mod resources;
mod service;
mod status;
mod sync;

pub use builder::{ContainerConfigBuilder, hash_container};
pub use config::RuntimeConfig;
pub use events::{EventBus, EventRecorder, EventType, RecordedEvent};
pub use hooks::{HookError, HookRunner};
pub use images::{EnsureImageError, ImagePuller};
pub use lifecycle::{
    MINIMUM_GRACE_PERIOD_SECONDS, POD_KILL_REASON, StartError, StartStage, resolve_grace_period,
};
pub use manager::{RuntimeManager, RuntimeManagerBuilder};
pub use mounts::make_mounts;
pub use options::{RunContainerOptions, RunOptionsProvider, VolumeMount, expand_container_command_and_args};
pub use refs::{ContainerRefManager, generate_container_ref};
pub use service::{RuntimeService, StreamingRuntime};
pub use status::get_termination_message;
pub use sync::{SyncAction, SyncError, SyncResult};
