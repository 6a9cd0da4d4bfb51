//! # podlet-common
//!
//! Shared utilities and types for the podlet container lifecycle core.
//!
//! This crate provides common functionality used across all podlet crates:
//! - Composite container IDs and random UID generation
//! - Standard filesystem paths
//! - Resource quantity parsing
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;
pub mod resource;

pub use error::{PodletError, PodletResult};
pub use id::ContainerId;
pub use paths::PodletPaths;
pub use resource::Quantity;
