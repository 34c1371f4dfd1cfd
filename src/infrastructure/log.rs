//! Execution log
//!
//! Host and guest both append human-readable records to the same log file.
//! Records are structured (`level`, `text`) until they reach a sink; colour
//! escape sequences are added by the [`LogFormat`] at write time only.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

const BOLD_GRAY: &str = "\x1b[1;30m";
const CYAN: &str = "\x1b[36m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// Kind of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Start or end of a guest run
    Banner,
    /// A command about to be executed
    Command,
    /// Echoed configuration
    Config,
    /// Progress message
    Info,
    /// Failure report
    Error,
}

impl LogLevel {
    fn color(self) -> &'static str {
        match self {
            LogLevel::Banner => BOLD_GREEN,
            LogLevel::Command | LogLevel::Info => BOLD_GRAY,
            LogLevel::Config => CYAN,
            LogLevel::Error => BOLD_RED,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Banner => "banner",
            LogLevel::Command => "command",
            LogLevel::Config => "config",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// One structured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Kind of entry
    pub level: LogLevel,
    /// Message, without formatting
    pub text: String,
}

impl LogRecord {
    /// Creates a record
    #[must_use]
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Presentation of records written to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// ANSI colour escape sequences around each record
    #[default]
    Ansi,
    /// Text only
    Plain,
}

impl LogFormat {
    /// Renders a record as one or more lines, newline-terminated
    #[must_use]
    pub fn render(self, record: &LogRecord) -> String {
        match self {
            LogFormat::Ansi => format!("{}{}{}\n", record.level.color(), record.text, RESET),
            LogFormat::Plain => format!("{}\n", record.text),
        }
    }
}

/// Append-only log writer over any sink
pub struct ExecutionLog<W: Write> {
    sink: W,
    format: LogFormat,
}

impl ExecutionLog<File> {
    /// Opens `path` in append mode, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file cannot be opened
    pub fn append_to(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file, LogFormat::Ansi))
    }
}

impl<W: Write> ExecutionLog<W> {
    /// Wraps a sink
    pub fn new(sink: W, format: LogFormat) -> Self {
        Self { sink, format }
    }

    /// Writes one record and flushes
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the sink cannot be written
    pub fn record(&mut self, record: &LogRecord) -> io::Result<()> {
        self.sink.write_all(self.format.render(record).as_bytes())?;
        self.sink.flush()
    }

    /// Shorthand for [`record`](Self::record)
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the sink cannot be written
    pub fn log(&mut self, level: LogLevel, text: impl Into<String>) -> io::Result<()> {
        self.record(&LogRecord::new(level, text))
    }

    /// Writes a block of raw text (command output, a configuration dump)
    /// wrapped in the colour of `level`
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the sink cannot be written
    pub fn block(&mut self, level: LogLevel, write: impl FnOnce(&mut W) -> io::Result<()>) -> io::Result<()> {
        if self.format == LogFormat::Ansi {
            self.sink.write_all(level.color().as_bytes())?;
        }
        write(&mut self.sink)?;
        if self.format == LogFormat::Ansi {
            self.sink.write_all(RESET.as_bytes())?;
            self.sink.write_all(b"\n")?;
        }
        self.sink.flush()
    }

    /// Direct access to the sink for raw output
    pub fn sink(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Unwraps the sink
    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Strips ANSI colour escape sequences from log text
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    crate::infrastructure::log_render::ANSI_PATTERN
        .replace_all(text, "")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_ansi_rendering() {
        let record = LogRecord::new(LogLevel::Command, "git clone repo");
        assert_eq!(
            LogFormat::Ansi.render(&record),
            "\x1b[1;30mgit clone repo\x1b[0m\n"
        );
        assert_eq!(LogFormat::Plain.render(&record), "git clone repo\n");
    }

    #[test]
    fn test_block_wraps_raw_output() {
        let mut log = ExecutionLog::new(Vec::new(), LogFormat::Ansi);
        log.block(LogLevel::Config, |sink| sink.write_all(b"a: 1\n"))
            .unwrap();
        let text = String::from_utf8(log.into_inner()).unwrap();
        assert_eq!(text, "\x1b[36ma: 1\n\x1b[0m\n");
        assert_eq!(strip_ansi(&text), "a: 1\n\n");
    }

    #[test]
    fn test_append_never_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("step-stdout");

        ExecutionLog::append_to(&path)
            .unwrap()
            .log(LogLevel::Info, "first")
            .unwrap();
        ExecutionLog::append_to(&path)
            .unwrap()
            .log(LogLevel::Info, "second")
            .unwrap();

        let text = strip_ansi(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(text, "first\nsecond\n");
    }
}
