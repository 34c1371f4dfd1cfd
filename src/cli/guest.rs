//! `artmanflow guest` - Container entry point
//!
//! Reads the configuration (stdin by default), writes the execution log to
//! stdout, which the host appends to the log file, and exits non-zero when
//! the step fails.

use anyhow::{Context, Result};
use artmanflow::executor::ProcessRunner;
use artmanflow::infrastructure::config_channel::{self, ConfigSource};
use artmanflow::infrastructure::{HostIdentity, LogFormat};
use artmanflow::step::{GuestContext, GuestPaths, StepConfig, StepKind, guest};
use std::io;

/// Runs the guest half of `kind`
pub fn run_guest(kind: StepKind, source: &ConfigSource) -> Result<()> {
    let config = load(kind, source)?;
    let identity = HostIdentity::from_env();
    tracing::debug!(execution_id = %config.execution_id(), ?identity, "Starting guest step");

    let invocation = shell_words::join(std::env::args());
    let mut runner = ProcessRunner::new();
    let mut stdout = io::stdout();
    let mut ctx = GuestContext::new(
        GuestPaths::new(config.guest_root_path()),
        identity,
        &mut runner,
        &mut stdout,
        LogFormat::Ansi,
    );

    guest::run(&config, &mut ctx, &invocation)
        .with_context(|| format!("Guest step {} failed", config.execution_id()))
}

fn load(kind: StepKind, source: &ConfigSource) -> Result<StepConfig> {
    let document =
        config_channel::read(source, None).context("Failed to read guest configuration")?;
    StepConfig::from_document(kind, document).context("Invalid guest configuration")
}
