//! Prelude module for common imports

pub use crate::executor::{CommandRunner, GuestCommand, ProcessRunner};
pub use crate::infrastructure::config_channel::{ConfigSink, ConfigSource};
pub use crate::infrastructure::{
    Config, ContainerLauncher, ContainerRuntime, ExecutionLog, HostIdentity, LaunchHandle,
    LaunchRequest, LaunchStatus, LogFormat, LogLevel, Mount,
};
pub use crate::step::{
    ExecutionHandle, ExecutionId, ExecutionStatus, GuestContext, GuestPaths, HostPaths,
    HostSettings, HostStep, RepoConfig, StepConfig, StepError, StepKind, StepRunner,
};
