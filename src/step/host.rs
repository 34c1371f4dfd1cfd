//! Host half of a step
//!
//! Prepares the execution workspace, writes the guest configuration and
//! launches the guest container without waiting for it. Progress is read
//! back from the workspace alone, so any process that knows the execution
//! id can report it.

use crate::infrastructure::config_channel::{self, ConfigSink};
use crate::infrastructure::log::ExecutionLog;
use crate::infrastructure::{ContainerLauncher, LaunchHandle, LaunchRequest, Mount};
use crate::step::{
    ExecutionId, GuestPaths, HostPaths, StepConfig, StepError, java_staging, sources_generation,
};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Name of the binary the guest runs from the mounted steps directory
pub const STEP_BINARY: &str = "artmanflow";

/// Host-side settings shared by every execution
#[derive(Debug, Clone)]
pub struct HostSettings {
    /// Directory under which execution workspaces are created
    pub temp_root: PathBuf,
    /// Directory holding [`STEP_BINARY`], mounted read-only into guests
    pub step_dir: PathBuf,
    /// Binary name inside `step_dir`
    pub step_binary: String,
    /// Launcher for guest containers
    pub launcher: ContainerLauncher,
}

impl HostSettings {
    /// Creates settings using the default binary name
    #[must_use]
    pub fn new(temp_root: impl Into<PathBuf>, step_dir: impl Into<PathBuf>, launcher: ContainerLauncher) -> Self {
        Self {
            temp_root: temp_root.into(),
            step_dir: step_dir.into(),
            step_binary: STEP_BINARY.to_string(),
            launcher,
        }
    }

    /// Host paths of an existing execution
    #[must_use]
    pub fn paths(&self, kind: crate::step::StepKind, execution_id: ExecutionId) -> HostPaths {
        HostPaths::new(&self.temp_root, &self.step_dir, kind, execution_id)
    }
}

/// Progress of an execution, derived from its workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Neither the completion artifact nor a failure snapshot exists yet
    InProgress,
    /// The completion artifact exists
    Succeeded,
    /// The guest left a failure snapshot and no completion artifact
    Failed,
}

impl ExecutionStatus {
    /// Reads the status of the execution at `paths`
    ///
    /// A guest that dies before it can snapshot stays `InProgress`.
    #[must_use]
    pub fn of(paths: &HostPaths) -> Self {
        if paths.completion_artifact().is_file() {
            ExecutionStatus::Succeeded
        } else if paths.snapshot_dir().is_dir() {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::InProgress
        }
    }

    /// Returns true once the execution will not change status again
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::InProgress)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStatus::InProgress => "in_progress",
            ExecutionStatus::Succeeded => "succeeded",
            ExecutionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One execution of a step, seen from the host
#[derive(Debug, Clone)]
pub struct HostStep {
    config: StepConfig,
    paths: HostPaths,
    guest: GuestPaths,
    launcher: ContainerLauncher,
    step_binary: String,
}

impl HostStep {
    /// Creates the host half for a validated configuration
    #[must_use]
    pub fn new(config: StepConfig, settings: &HostSettings) -> Self {
        let paths = settings.paths(config.kind(), config.execution_id().clone());
        let guest = GuestPaths::new(config.guest_root_path());
        Self {
            config,
            paths,
            guest,
            launcher: settings.launcher.clone(),
            step_binary: settings.step_binary.clone(),
        }
    }

    /// Configuration as supplied by the caller
    #[must_use]
    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Host view of the execution's directories
    #[must_use]
    pub fn paths(&self) -> &HostPaths {
        &self.paths
    }

    /// Execution identifier
    #[must_use]
    pub fn execution_id(&self) -> &ExecutionId {
        self.config.execution_id()
    }

    /// Creates the workspace and the execution log; safe to repeat
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Io`] if either cannot be created.
    pub fn pre_execute(&self) -> Result<(), StepError> {
        let workspace = self.paths.workspace();
        fs::create_dir_all(&workspace).map_err(|e| {
            StepError::Io(format!("cannot create workspace '{}': {e}", workspace.display()))
        })?;
        ExecutionLog::append_to(&self.paths.stdout_file())?;

        tracing::info!(
            execution_id = %self.execution_id(),
            step = %self.config.kind(),
            workspace = %workspace.display(),
            "Workspace ready"
        );
        Ok(())
    }

    /// Writes the guest configuration and creates the output directory,
    /// returning what the launcher needs
    ///
    /// # Errors
    ///
    /// Returns [`StepError::WorkspaceConflict`] if the output directory
    /// already exists, and [`StepError::Io`] on filesystem failures.
    pub fn prepare(&self) -> Result<LaunchRequest, StepError> {
        let (guest_config, extra_mounts) = self.stage()?;

        let output = self.paths.output_dir();
        fs::create_dir(&output).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StepError::WorkspaceConflict {
                path: output.display().to_string(),
            },
            _ => StepError::Io(format!("cannot create '{}': {e}", output.display())),
        })?;

        let guest_config_file = self.paths.guest_config_file();
        config_channel::write(&guest_config, ConfigSink::Path(&guest_config_file))?;

        let mut mounts = vec![
            Mount::read_only(self.paths.step_dir(), self.guest.step_dir()),
            Mount::read_write(output, self.guest.output_dir()),
        ];
        mounts.extend(extra_mounts);

        Ok(LaunchRequest {
            image: self.config.docker_image().to_string(),
            command: vec![
                self.guest.step_binary(&self.step_binary),
                "guest".to_string(),
                self.config.kind().slug().to_string(),
            ],
            working_dir: Some(self.guest.root().to_string()),
            mounts,
            stdin: guest_config_file,
            log: self.paths.stdout_file(),
        })
    }

    /// Guest configuration with host paths replaced by their mount points
    fn stage(&self) -> Result<(StepConfig, Vec<Mount>), StepError> {
        match &self.config {
            StepConfig::SourcesGeneration(config) => {
                let (staged, mounts) = sources_generation::stage(config, &self.guest);
                Ok((StepConfig::SourcesGeneration(staged), mounts))
            }
            StepConfig::JavaSourcesStaging(config) => {
                let (staged, mounts) = java_staging::stage(config, &self.guest)?;
                Ok((StepConfig::JavaSourcesStaging(staged), mounts))
            }
        }
    }

    /// Prepares and starts the guest, returning as soon as it is started
    ///
    /// # Errors
    ///
    /// See [`prepare`](Self::prepare).
    pub fn execute(&self) -> Result<LaunchHandle, StepError> {
        let request = self.prepare()?;
        if let StepConfig::SourcesGeneration(config) = &self.config {
            self.launcher.pull(&config.docker_image, &self.paths.stdout_file())?;
        }
        let handle = self.launcher.launch(&request)?;
        tracing::info!(execution_id = %self.execution_id(), "Guest launched");
        Ok(handle)
    }

    /// Current status of the execution
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus::of(&self.paths)
    }
}

/// Handle to a host step running in the background
#[derive(Debug)]
pub struct ExecutionHandle {
    execution_id: ExecutionId,
    paths: HostPaths,
    thread: JoinHandle<Result<LaunchHandle, StepError>>,
}

impl ExecutionHandle {
    /// Execution identifier
    #[must_use]
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// Returns true once the container has been launched or launching failed
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Status of the execution, read from the workspace
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus::of(&self.paths)
    }

    /// Waits for the launch and returns the container handle
    ///
    /// # Errors
    ///
    /// Returns the host step's error, or [`StepError::Launch`] if its
    /// thread panicked.
    pub fn join(self) -> Result<LaunchHandle, StepError> {
        self.thread
            .join()
            .map_err(|_| StepError::Launch(format!("host step {} panicked", self.execution_id)))?
    }
}

/// Runs host steps
pub struct StepRunner;

impl StepRunner {
    /// Runs [`HostStep::pre_execute`] and [`HostStep::execute`] in the
    /// calling thread
    ///
    /// # Errors
    ///
    /// Returns the first failing phase's error.
    pub fn run(step: &HostStep) -> Result<LaunchHandle, StepError> {
        step.pre_execute()?;
        step.execute()
    }

    /// Runs the host step on a background thread and returns immediately
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Io`] if the thread cannot be started.
    pub fn spawn(step: HostStep) -> Result<ExecutionHandle, StepError> {
        let execution_id = step.execution_id().clone();
        let paths = step.paths().clone();
        let thread = thread::Builder::new()
            .name(format!("artmanflow-{execution_id}"))
            .spawn(move || Self::run(&step))?;

        Ok(ExecutionHandle {
            execution_id,
            paths,
            thread,
        })
    }
}
