//! Container launcher (Docker/Podman)
//!
//! Builds a `run --rm` invocation from a [`LaunchRequest`] and starts it
//! without waiting. The container's stdin comes from the serialized guest
//! configuration; stdout and stderr are appended to the execution log.

use crate::infrastructure::log::{ExecutionLog, LogLevel};
use crate::step::StepError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Environment variable carrying the host's numeric user id into the guest
pub const HOST_USER_ID_VAR: &str = "HOST_USER_ID";

/// Environment variable carrying the host's numeric group id into the guest
pub const HOST_GROUP_ID_VAR: &str = "HOST_GROUP_ID";

/// Container runtime type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    /// Docker runtime
    #[default]
    Docker,
    /// Podman runtime
    Podman,
}

impl ContainerRuntime {
    /// Gets the runtime executable name
    #[must_use]
    pub fn command(self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }
}

impl fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl std::str::FromStr for ContainerRuntime {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(ContainerRuntime::Docker),
            "podman" => Ok(ContainerRuntime::Podman),
            other => Err(StepError::Configuration(format!(
                "unknown container runtime '{other}'"
            ))),
        }
    }
}

/// Access mode of a bind mount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MountMode {
    /// Read-write
    #[default]
    ReadWrite,
    /// Read-only
    ReadOnly,
}

/// One bind mount: a host path paired with a guest path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// Host side
    pub host: PathBuf,
    /// Guest side, `/`-separated
    pub guest: String,
    /// Access mode
    pub mode: MountMode,
}

impl Mount {
    /// Read-write mount
    #[must_use]
    pub fn read_write(host: impl Into<PathBuf>, guest: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            guest: guest.into(),
            mode: MountMode::ReadWrite,
        }
    }

    /// Read-only mount
    #[must_use]
    pub fn read_only(host: impl Into<PathBuf>, guest: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            guest: guest.into(),
            mode: MountMode::ReadOnly,
        }
    }

    /// Value of the `-v` flag: `host:guest[:ro]`
    #[must_use]
    pub fn volume_arg(&self) -> String {
        let mut arg = format!("{}:{}", self.host.display(), self.guest);
        if self.mode == MountMode::ReadOnly {
            arg.push_str(":ro");
        }
        arg
    }
}

/// Numeric user and group the guest hands file ownership back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostIdentity {
    /// User id
    pub uid: u32,
    /// Group id
    pub gid: u32,
}

impl HostIdentity {
    /// Creates an identity
    #[must_use]
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Identity of the current process
    #[cfg(unix)]
    #[must_use]
    pub fn current() -> Self {
        let uid = unsafe { libc::getuid() };
        let gid = unsafe { libc::getgid() };
        Self { uid, gid }
    }

    /// Identity of the current process
    #[cfg(not(unix))]
    #[must_use]
    pub fn current() -> Self {
        // nobody:nogroup where no numeric ids exist
        Self {
            uid: 65534,
            gid: 65534,
        }
    }

    /// Parses the values exported by the launcher; `None` when either is
    /// missing, malformed or zero (root needs no ownership fix)
    #[must_use]
    pub fn from_vars(uid: Option<&str>, gid: Option<&str>) -> Option<Self> {
        let uid: u32 = uid?.trim().parse().ok()?;
        let gid: u32 = gid?.trim().parse().ok()?;
        if uid == 0 || gid == 0 {
            return None;
        }
        Some(Self { uid, gid })
    }

    /// Reads [`HOST_USER_ID_VAR`] and [`HOST_GROUP_ID_VAR`] from the process
    /// environment
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let uid = std::env::var(HOST_USER_ID_VAR).ok();
        let gid = std::env::var(HOST_GROUP_ID_VAR).ok();
        Self::from_vars(uid.as_deref(), gid.as_deref())
    }

    /// `uid:gid`, as `chown` expects it
    #[must_use]
    pub fn owner_arg(&self) -> String {
        format!("{}:{}", self.uid, self.gid)
    }
}

/// Everything needed to start one guest container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Image to run
    pub image: String,
    /// Command run inside the container
    pub command: Vec<String>,
    /// Working directory inside the container
    pub working_dir: Option<String>,
    /// Bind mounts, in order
    pub mounts: Vec<Mount>,
    /// File fed to the container's stdin
    pub stdin: PathBuf,
    /// Log file receiving stdout and stderr, opened in append mode
    pub log: PathBuf,
}

/// Observed state of a launched container process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStatus {
    /// Still running
    Running,
    /// Exited; `None` when terminated by a signal
    Exited(Option<i32>),
    /// The runtime could not be started; the reason is also in the log
    FailedToStart(String),
}

impl LaunchStatus {
    /// Returns true for a zero exit code
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, LaunchStatus::Exited(Some(0)))
    }
}

#[derive(Debug)]
enum HandleState {
    Running(Child),
    Done(LaunchStatus),
}

/// Handle to a launched container process
///
/// Dropping the handle does not stop the container.
#[derive(Debug)]
pub struct LaunchHandle {
    command_line: String,
    state: Mutex<HandleState>,
}

impl LaunchHandle {
    fn running(command_line: String, child: Child) -> Self {
        Self {
            command_line,
            state: Mutex::new(HandleState::Running(child)),
        }
    }

    fn failed(command_line: String, reason: String) -> Self {
        Self {
            command_line,
            state: Mutex::new(HandleState::Done(LaunchStatus::FailedToStart(reason))),
        }
    }

    /// The command line that was started
    #[must_use]
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Current status, without blocking
    pub fn status(&self) -> LaunchStatus {
        let mut state = self.state.lock();
        let status = match &mut *state {
            HandleState::Done(status) => return status.clone(),
            HandleState::Running(child) => match child.try_wait() {
                Ok(None) => return LaunchStatus::Running,
                Ok(Some(exit)) => LaunchStatus::Exited(exit.code()),
                Err(e) => LaunchStatus::FailedToStart(e.to_string()),
            },
        };
        *state = HandleState::Done(status.clone());
        status
    }

    /// Blocks until the container process exits
    pub fn join(&self) -> LaunchStatus {
        let mut state = self.state.lock();
        let status = match &mut *state {
            HandleState::Done(status) => return status.clone(),
            HandleState::Running(child) => match child.wait() {
                Ok(exit) => LaunchStatus::Exited(exit.code()),
                Err(e) => LaunchStatus::FailedToStart(e.to_string()),
            },
        };
        *state = HandleState::Done(status.clone());
        status
    }
}

/// Starts guest containers
#[derive(Debug, Clone)]
pub struct ContainerLauncher {
    runtime: ContainerRuntime,
    program: String,
    identity: HostIdentity,
}

impl ContainerLauncher {
    /// Creates a launcher for the given runtime, exporting `identity` to
    /// every guest
    #[must_use]
    pub fn new(runtime: ContainerRuntime, identity: HostIdentity) -> Self {
        Self {
            runtime,
            program: runtime.command().to_string(),
            identity,
        }
    }

    /// Replaces the executable invoked for the runtime
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Container runtime
    #[must_use]
    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    /// Identity exported to guests
    #[must_use]
    pub fn identity(&self) -> HostIdentity {
        self.identity
    }

    /// Builds the full argv, program first
    #[must_use]
    pub fn build_command(&self, request: &LaunchRequest) -> Vec<String> {
        let mut argv = vec![self.program.clone(), "run".to_string(), "--rm".to_string()];

        if let Some(dir) = &request.working_dir {
            argv.push("-w".to_string());
            argv.push(dir.clone());
        }

        for mount in &request.mounts {
            argv.push("-v".to_string());
            argv.push(mount.volume_arg());
        }

        argv.push("-e".to_string());
        argv.push(format!("{HOST_USER_ID_VAR}={}", self.identity.uid));
        argv.push("-e".to_string());
        argv.push(format!("{HOST_GROUP_ID_VAR}={}", self.identity.gid));
        argv.push("-i".to_string());
        argv.push(request.image.clone());
        argv.extend(request.command.iter().cloned());
        argv
    }

    /// Starts the container and returns immediately
    ///
    /// The command line is appended to the log before the process starts.
    /// A runtime that cannot be started is reported in the log and in the
    /// returned handle, not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Io`] if the stdin or log file cannot be opened.
    pub fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, StepError> {
        let argv = self.build_command(request);
        let command_line = shell_words::join(&argv);

        let stdin = File::open(&request.stdin).map_err(|e| {
            StepError::Io(format!("cannot open '{}': {e}", request.stdin.display()))
        })?;
        let stdout = open_log(&request.log)?;
        let stderr = stdout.try_clone()?;

        let mut log = ExecutionLog::append_to(&request.log)?;
        log.log(
            LogLevel::Command,
            format!(
                "{command_line} < {} >> {} 2>&1",
                request.stdin.display(),
                request.log.display()
            ),
        )?;

        tracing::info!(runtime = %self.runtime, image = %request.image, "Launching guest container");
        tracing::debug!(command = %command_line, "Container command line");

        let spawned = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn();

        match spawned {
            Ok(child) => Ok(LaunchHandle::running(command_line, child)),
            Err(e) => {
                let reason = format!("failed to start {}: {e}", self.program);
                tracing::error!(error = %reason, "Container launch failed");
                log.log(LogLevel::Error, reason.clone())?;
                Ok(LaunchHandle::failed(command_line, reason))
            }
        }
    }

    /// Pulls `image`, appending the runtime's output to the log; the exit
    /// status is only logged
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Io`] if the log file cannot be opened.
    pub fn pull(&self, image: &str, log_path: &Path) -> Result<(), StepError> {
        let argv = [self.program.as_str(), "pull", image];
        let mut log = ExecutionLog::append_to(log_path)?;
        log.log(LogLevel::Command, shell_words::join(argv))?;

        let stdout = open_log(log_path)?;
        let stderr = stdout.try_clone()?;
        let status = Command::new(argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status();

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::warn!(image = %image, code = ?status.code(), "Image pull failed");
                log.log(LogLevel::Error, format!("pull of {image} exited with {status}"))?;
            }
            Err(e) => {
                tracing::warn!(image = %image, error = %e, "Image pull could not start");
                log.log(LogLevel::Error, format!("failed to start {}: {e}", self.program))?;
            }
        }
        Ok(())
    }

    /// Checks if the container runtime is available
    #[must_use]
    pub fn is_runtime_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

fn open_log(path: &Path) -> Result<File, StepError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StepError::Io(format!("cannot open log '{}': {e}", path.display())))
}
