//! Command execution traits
//!
//! Guest steps describe the commands they need as [`GuestCommand`] values
//! and hand them to a [`CommandRunner`], so the sequencing logic can be
//! exercised without a container or the external tools.

use crate::step::StepError;
use crate::step::repository::MASKED;
use std::fmt;

/// A command to run inside the guest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestCommand {
    /// Program and arguments
    pub argv: Vec<String>,
    /// Working directory, guest-side
    pub cwd: Option<String>,
    /// Hide the arguments when logging (they carry credentials)
    pub masked: bool,
}

impl GuestCommand {
    /// Creates a command from its argv
    #[must_use]
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            masked: false,
        }
    }

    /// Sets the working directory
    #[must_use]
    pub fn in_dir(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Marks the command as carrying secrets
    #[must_use]
    pub fn masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }

    /// Program name
    #[must_use]
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Printable form of the arguments, masked when needed
    #[must_use]
    pub fn printable(&self) -> String {
        if self.masked {
            MASKED.to_string()
        } else {
            shell_words::join(&self.argv)
        }
    }
}

impl fmt::Display for GuestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cwd {
            Some(cwd) => write!(f, "{} (cwd: {cwd})", self.printable()),
            None => f.write_str(&self.printable()),
        }
    }
}

/// Runs guest commands to completion
pub trait CommandRunner {
    /// Runs `command`, failing on a non-zero exit
    ///
    /// # Errors
    ///
    /// Returns [`StepError::CommandFailed`] on a non-zero exit and
    /// [`StepError::Io`] if the program cannot be started.
    fn run(&mut self, command: &GuestCommand) -> Result<(), StepError>;
}
