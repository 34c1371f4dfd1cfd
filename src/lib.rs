//! # artmanflow - containerized code generation steps
//!
//! Each step runs in two halves. The host half prepares a workspace under a
//! temporary root, writes the configuration the guest will read, and
//! launches a container without waiting for it. The guest half runs inside
//! the container, executes the step's commands, logs each one, and leaves
//! either a completion artifact or a debug snapshot in the mounted output
//! directory.
//!
//! ## Steps
//!
//! - **Sources generation**: checks out the generator and API definitions,
//!   runs the generator per API and archives the results.
//! - **Java sources staging**: copies generated modules into a branch of a
//!   staging repository and pushes it.
//!
//! ## Layout
//!
//! - [`step`]: configuration, identifiers, paths and both step halves
//! - [`infrastructure`]: container launcher, configuration channel,
//!   execution log, settings
//! - [`executor`]: guest command execution

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod step;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{CommandRunner, GuestCommand, ProcessRunner};
pub use infrastructure::{
    Config, ContainerLauncher, ContainerRuntime, HostIdentity, LaunchHandle, LaunchStatus, Mount,
};
pub use step::{
    ExecutionHandle, ExecutionId, ExecutionStatus, HostStep, StepConfig, StepError, StepKind,
    StepRunner,
};

/// Version of the artmanflow crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
