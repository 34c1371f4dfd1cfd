//! Process-backed command runner
//!
//! Children inherit the runner's standard streams, which inside the guest
//! are the execution log, so command output lands in the log right after
//! the line announcing the command.

use crate::executor::{CommandRunner, GuestCommand};
use crate::step::StepError;
use std::collections::HashMap;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::time::Instant;

/// Runs commands as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    env: HashMap<String, String>,
}

impl ProcessRunner {
    /// Creates a runner that passes the current environment through
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an environment variable for every command
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, command: &GuestCommand) -> Result<(), StepError> {
        let Some((program, args)) = command.argv.split_first() else {
            return Err(StepError::Configuration("empty command".to_string()));
        };

        // keep our own buffered output ahead of the child's
        io::stdout().flush()?;
        io::stderr().flush()?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.envs(&self.env);
        cmd.stdin(Stdio::null());
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let start = Instant::now();
        tracing::debug!(command = %command, "Executing guest command");

        let status = cmd.status().map_err(|e| {
            StepError::Io(format!("failed to start '{}': {e}", command.program()))
        })?;

        tracing::debug!(
            command = %command.program(),
            duration_ms = start.elapsed().as_millis(),
            code = ?status.code(),
            "Guest command finished"
        );

        if status.success() {
            Ok(())
        } else {
            Err(StepError::CommandFailed {
                command: command.printable(),
                code: status.code().unwrap_or(-1),
            })
        }
    }
}
