//! `artmanflow host` - Stage and launch a step

use anyhow::{Context, Result};
use artmanflow::infrastructure::LaunchStatus;
use artmanflow::infrastructure::config_channel::{self, ConfigSource};
use artmanflow::step::{ExecutionId, HostSettings, HostStep, StepConfig, StepKind, StepRunner};

/// What a host run reports back
#[derive(Debug)]
pub struct HostOutcome {
    /// Execution id, for later `status` and `log` calls
    pub execution_id: ExecutionId,
    /// Guest exit code, only known when waiting
    pub exit_code: Option<i32>,
}

/// Reads the configuration, launches the guest and optionally waits for it
///
/// A fresh execution id with the step's prefix is used unless the
/// configuration carries one. A runtime that cannot be started is only
/// recorded in the execution log, unless `wait` asks for the guest's outcome.
pub fn run_host(
    kind: StepKind,
    source: &ConfigSource,
    settings: &HostSettings,
    wait: bool,
) -> Result<HostOutcome> {
    let default_id = ExecutionId::generate(kind.id_prefix())?;
    let document = config_channel::read(source, Some(&default_id))
        .context("Failed to read step configuration")?;
    let config =
        StepConfig::from_document(kind, document).context("Invalid step configuration")?;

    let step = HostStep::new(config, settings);
    let execution_id = step.execution_id().clone();
    tracing::info!(execution_id = %execution_id, step = %kind, "Starting host step");

    let launch = StepRunner::run(&step)
        .with_context(|| format!("Failed to launch execution {execution_id}"))?;

    let status = if wait { launch.join() } else { launch.status() };
    let exit_code = match status {
        LaunchStatus::FailedToStart(reason) if wait => {
            anyhow::bail!("Guest container for {execution_id} did not start: {reason}")
        }
        LaunchStatus::FailedToStart(reason) => {
            tracing::warn!(execution_id = %execution_id, reason = %reason, "Guest container did not start");
            None
        }
        LaunchStatus::Exited(code) if wait => Some(code.unwrap_or(-1)),
        LaunchStatus::Exited(_) | LaunchStatus::Running => None,
    };

    Ok(HostOutcome {
        execution_id,
        exit_code,
    })
}
