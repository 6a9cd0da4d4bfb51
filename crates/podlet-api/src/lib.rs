//! # podlet-api
//!
//! Data types exchanged by the podlet lifecycle core.
//!
//! This crate provides Rust types for:
//! - The declarative pod model (pods, containers, hooks, security contexts)
//! - The container runtime service (descriptors, filters, runtime status)
//! - Normalized agent-side status views (container status, running pods)

#![warn(missing_docs)]

pub mod pod;
pub mod runtime;
pub mod status;

pub use pod::{Container, ObjectReference, Pod};
pub use status::{ContainerStatus, PodStatus, RunningPod};
