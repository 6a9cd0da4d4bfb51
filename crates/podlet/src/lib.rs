//! # podlet
//!
//! The container lifecycle core of a pod node agent.
//!
//! Podlet drives a pluggable container runtime on behalf of a pod sync loop:
//!
//! - **Start**: ensure image, build the runtime descriptor, create, start and
//!   run the post-start hook
//! - **Kill**: race the pre-stop hook against the grace period, then stop,
//!   either for one container or concurrently for a whole pod
//! - **Status**: rebuild normalized container statuses from runtime reports,
//!   recovering termination messages from the mounted log file
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use podlet::runtime::{
//!     HookRunner, ImagePuller, RunOptionsProvider, RuntimeConfig, RuntimeManager,
//!     RuntimeService,
//! };
//!
//! # fn example(
//! #     runtime: Arc<dyn RuntimeService>,
//! #     images: Arc<dyn ImagePuller>,
//! #     options: Arc<dyn RunOptionsProvider>,
//! #     hooks: Arc<dyn HookRunner>,
//! # ) -> podlet_common::PodletResult<()> {
//! let manager = RuntimeManager::builder(RuntimeConfig::default())
//!     .runtime(runtime)
//!     .image_puller(images)
//!     .run_options(options)
//!     .hook_runner(hooks)
//!     .build()?;
//! # let _ = manager;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod runtime;

pub use runtime::RuntimeManager;
