//! `artmanflow status` and `artmanflow log` - Inspect an execution

use anyhow::{Context, Result};
use artmanflow::infrastructure::log::strip_ansi;
use artmanflow::infrastructure::log_render::render_html;
use artmanflow::step::{ExecutionId, ExecutionStatus, HostPaths, HostSettings, StepKind};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Status of one execution, as printed by `status --json`
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Execution id
    pub execution_id: String,
    /// Step the execution belongs to
    pub step: StepKind,
    /// Derived status
    pub status: ExecutionStatus,
    /// Host workspace
    pub workspace: PathBuf,
    /// Execution log
    pub log: PathBuf,
}

/// How `log` prints the execution log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// As written, with colour escapes
    Ansi,
    /// Colour escapes removed
    Plain,
    /// HTML `<pre>` block
    Html,
}

fn existing(kind: StepKind, raw_id: &str, settings: &HostSettings) -> Result<HostPaths> {
    let execution_id = ExecutionId::validate(raw_id)?;
    let paths = settings.paths(kind, execution_id);
    anyhow::ensure!(
        paths.workspace().is_dir(),
        "Unknown execution '{raw_id}': no workspace at {}",
        paths.workspace().display()
    );
    Ok(paths)
}

/// Reports the status of an execution
pub fn status(kind: StepKind, raw_id: &str, settings: &HostSettings) -> Result<StatusReport> {
    let paths = existing(kind, raw_id, settings)?;
    Ok(StatusReport {
        execution_id: paths.execution_id().to_string(),
        step: kind,
        status: ExecutionStatus::of(&paths),
        workspace: paths.workspace(),
        log: paths.stdout_file(),
    })
}

/// Reads the execution log in the requested format
pub fn log(kind: StepKind, raw_id: &str, settings: &HostSettings, output: LogOutput) -> Result<String> {
    let paths = existing(kind, raw_id, settings)?;
    let path = paths.stdout_file();
    let bytes =
        fs::read(&path).with_context(|| format!("Failed to read log: {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    Ok(match output {
        LogOutput::Ansi => text.into_owned(),
        LogOutput::Plain => strip_ansi(&text),
        LogOutput::Html => render_html(&text),
    })
}
