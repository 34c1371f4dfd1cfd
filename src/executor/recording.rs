//! Command runner that records instead of executing

use crate::executor::{CommandRunner, GuestCommand};
use crate::step::StepError;

/// Records every command; fails the first one whose program and
/// arguments contain `fail_on`
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    pub commands: Vec<GuestCommand>,
    pub fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            fail_on: Some(needle.into()),
        }
    }

    /// Recorded commands joined with spaces, for compact assertions
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.argv.join(" ")).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, command: &GuestCommand) -> Result<(), StepError> {
        self.commands.push(command.clone());
        match &self.fail_on {
            Some(needle) if command.argv.join(" ").contains(needle.as_str()) => {
                self.fail_on = None;
                Err(StepError::CommandFailed {
                    command: command.printable(),
                    code: 1,
                })
            }
            _ => Ok(()),
        }
    }
}
