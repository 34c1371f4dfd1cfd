//! Error types for step execution

use thiserror::Error;

/// Errors that can occur while staging, launching or running a step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Execution identifier contains characters outside `[A-Za-z0-9_.-]`
    #[error("Invalid execution id: '{value}'")]
    InvalidIdentifier {
        /// The rejected value.
        value: String,
    },

    /// A required configuration key is absent
    #[error("Missing required configuration key: '{key}'")]
    MissingKey {
        /// Dotted path of the missing key.
        key: String,
    },

    /// Configuration is present but unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The output directory of an execution already exists
    #[error("Workspace conflict: '{path}' already exists")]
    WorkspaceConflict {
        /// The directory that should not have existed.
        path: String,
    },

    /// A guest command exited unsuccessfully
    #[error("Command '{command}' failed with exit code {code}")]
    CommandFailed {
        /// Printable form of the command (credentials masked).
        command: String,
        /// Exit code, -1 when terminated by a signal.
        code: i32,
    },

    /// The configuration document could not be parsed or serialized
    #[error("Configuration document error: {0}")]
    Document(String),

    /// The background host step did not complete
    #[error("Launch error: {0}")]
    Launch(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StepError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for StepError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Document(err.to_string())
    }
}

impl StepError {
    /// Returns true if the error was raised by a guest command
    #[must_use]
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: StepError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, StepError::Io(ref msg) if msg.contains("gone")));
    }

    #[test]
    fn test_display_messages() {
        let err = StepError::MissingKey {
            key: "artman.git_repo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required configuration key: 'artman.git_repo'"
        );

        let err = StepError::CommandFailed {
            command: "git clone".to_string(),
            code: 128,
        };
        assert!(err.is_command_failure());
        assert_eq!(err.to_string(), "Command 'git clone' failed with exit code 128");
    }
}
