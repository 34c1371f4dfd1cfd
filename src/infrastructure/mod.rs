//! Infrastructure layer
//!
//! Container runtimes, the configuration channel between host and guest,
//! the execution log and application settings.

mod config;
pub mod config_channel;
pub mod container;
pub mod log;
pub mod log_render;
mod logging;

pub use config::{Config, LOG_VAR, RUNTIME_VAR, STEP_DIR_VAR, TEMP_ROOT_VAR};
pub use container::{
    ContainerLauncher, ContainerRuntime, HostIdentity, LaunchHandle, LaunchRequest, LaunchStatus,
    Mount, MountMode,
};
pub use log::{ExecutionLog, LogFormat, LogLevel, LogRecord};
pub use logging::init_logging;
