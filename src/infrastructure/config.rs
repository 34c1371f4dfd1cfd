//! Configuration management
//!
//! Host settings come from `ARTMANFLOW_*` environment variables; every
//! variable is optional.

use crate::infrastructure::{ContainerLauncher, ContainerRuntime, HostIdentity};
use crate::step::{HostSettings, StepError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Variable overriding the directory execution workspaces live under
pub const TEMP_ROOT_VAR: &str = "ARTMANFLOW_TEMP_ROOT";
/// Variable selecting `docker` or `podman`
pub const RUNTIME_VAR: &str = "ARTMANFLOW_RUNTIME";
/// Variable overriding the directory mounted into guests as their steps
/// directory
pub const STEP_DIR_VAR: &str = "ARTMANFLOW_STEP_DIR";
/// Variable setting the diagnostic log filter
pub const LOG_VAR: &str = "ARTMANFLOW_LOG";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory under which execution workspaces are created
    pub temp_root: PathBuf,
    /// Container runtime
    pub runtime: ContainerRuntime,
    /// Directory holding the binary guests run
    pub step_dir: PathBuf,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir(),
            runtime: ContainerRuntime::Docker,
            step_dir: default_step_dir(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Configuration`] for an unknown runtime.
    pub fn from_env() -> Result<Self, StepError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Configuration`] for an unknown runtime.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StepError> {
        let defaults = Self::default();
        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            temp_root: set(TEMP_ROOT_VAR).map_or(defaults.temp_root, PathBuf::from),
            runtime: set(RUNTIME_VAR)
                .map(|value| value.parse::<ContainerRuntime>())
                .transpose()?
                .unwrap_or(defaults.runtime),
            step_dir: set(STEP_DIR_VAR).map_or(defaults.step_dir, PathBuf::from),
            log_level: set(LOG_VAR).unwrap_or(defaults.log_level),
        })
    }

    /// Host settings for launching steps as the current user
    #[must_use]
    pub fn host_settings(&self) -> HostSettings {
        let launcher = ContainerLauncher::new(self.runtime, HostIdentity::current());
        HostSettings::new(&self.temp_root, &self.step_dir, launcher)
    }
}

fn default_step_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
