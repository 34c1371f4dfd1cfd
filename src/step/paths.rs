//! Host and guest views of an execution's directory tree
//!
//! The host view is a set of absolute paths on the local filesystem, the
//! guest view a set of `/`-joined strings in the container's namespace.
//! Neither view converts into the other; the only bridge is an explicit
//! [`Mount`](crate::infrastructure::Mount) pairing.

use crate::step::{ExecutionId, StepKind};
use std::path::{Path, PathBuf};

/// Name of the output directory in both views
pub const OUTPUT_DIR: &str = "guest_output";

/// Name of the guest directory holding the mounted step binaries
pub const STEPS_DIR: &str = "steps";

/// Name of the debug snapshot directory inside the output directory
pub const SNAPSHOT_DIR: &str = "guest_root_dir_snapshot";

/// Host-side paths of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    temp_root: PathBuf,
    step_dir: PathBuf,
    kind: StepKind,
    execution_id: ExecutionId,
}

impl HostPaths {
    /// Creates the host view for an execution
    ///
    /// * `temp_root` - Directory under which execution workspaces live
    /// * `step_dir` - Host directory mounted read-only into the guest
    #[must_use]
    pub fn new(
        temp_root: impl Into<PathBuf>,
        step_dir: impl Into<PathBuf>,
        kind: StepKind,
        execution_id: ExecutionId,
    ) -> Self {
        Self {
            temp_root: temp_root.into(),
            step_dir: step_dir.into(),
            kind,
            execution_id,
        }
    }

    /// Execution identifier the paths are derived from
    #[must_use]
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// Step kind the paths belong to
    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Directory mounted read-only at the guest's steps directory
    #[must_use]
    pub fn step_dir(&self) -> &Path {
        &self.step_dir
    }

    /// `<temp_root>/artmanflow-<id>`
    #[must_use]
    pub fn workspace(&self) -> PathBuf {
        self.temp_root
            .join(format!("artmanflow-{}", self.execution_id))
    }

    /// A file or directory directly inside the workspace
    #[must_use]
    pub fn workspace_subpath(&self, basename: &str) -> PathBuf {
        self.workspace().join(basename)
    }

    /// Append-only execution log
    #[must_use]
    pub fn stdout_file(&self) -> PathBuf {
        self.workspace_subpath(&format!("{}-stdout", self.kind.name()))
    }

    /// Serialized guest configuration, fed to the container's stdin
    #[must_use]
    pub fn guest_config_file(&self) -> PathBuf {
        self.workspace_subpath(&format!("{}_guest.yaml", self.kind.name()))
    }

    /// Directory mounted read-write at the guest's output directory
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.workspace_subpath(OUTPUT_DIR)
    }

    /// A file inside the output directory
    #[must_use]
    pub fn output_subpath(&self, basename: &str) -> PathBuf {
        self.output_dir().join(basename)
    }

    /// The file whose existence signals a finished execution
    #[must_use]
    pub fn completion_artifact(&self) -> PathBuf {
        self.output_subpath(self.kind.completion_artifact())
    }

    /// Host location of the guest's debug snapshot
    #[must_use]
    pub fn snapshot_dir(&self) -> PathBuf {
        self.output_subpath(SNAPSHOT_DIR)
    }
}

/// Guest-side paths, rooted at the container's working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestPaths {
    root: String,
}

impl GuestPaths {
    /// Creates the guest view rooted at `guest_root_path`
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let trimmed = root.trim_end_matches('/');
        let root = if trimmed.is_empty() { root } else { trimmed.to_string() };
        Self { root }
    }

    /// The container's working root
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Joins path segments under the root with `/`
    #[must_use]
    pub fn root_subpath(&self, segments: &[&str]) -> String {
        join(&self.root, segments)
    }

    /// Where the step binaries are mounted read-only
    #[must_use]
    pub fn step_dir(&self) -> String {
        self.root_subpath(&[STEPS_DIR])
    }

    /// A binary inside the steps directory
    #[must_use]
    pub fn step_binary(&self, name: &str) -> String {
        self.root_subpath(&[STEPS_DIR, name])
    }

    /// Where the host's output directory is mounted read-write
    #[must_use]
    pub fn output_dir(&self) -> String {
        self.root_subpath(&[OUTPUT_DIR])
    }

    /// Joins path segments under the output directory with `/`
    #[must_use]
    pub fn output_subpath(&self, segments: &[&str]) -> String {
        join(&self.output_dir(), segments)
    }

    /// Where the debug snapshot of the guest root is written
    #[must_use]
    pub fn snapshot_dir(&self) -> String {
        self.output_subpath(&[SNAPSHOT_DIR])
    }
}

fn join(base: &str, segments: &[&str]) -> String {
    let mut joined = base.to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}
