//! Sources generation step
//!
//! Checks out the generator, toolkit and API definitions, runs the
//! generator once per configured API and archives everything it produced
//! into the output directory.

use crate::executor::GuestCommand;
use crate::infrastructure::Mount;
use crate::infrastructure::config_channel::{self, ConfigSink};
use crate::infrastructure::log::LogLevel;
use crate::step::guest::GuestContext;
use crate::step::ARTIFACT_ARCHIVE;
use crate::step::repository;
use crate::step::{ApiTarget, GuestPaths, SourcesGenerationConfig, StepError};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Directory the generator writes into, under the output directory
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Generator output directory renamed after generation, relative to the
/// artifacts directory
pub const LONGRUNNING_RENAME: (&str, &str) = (
    "java/gapic-google-cloud-longrunning-v1",
    "java/gapic-google-longrunning-v1",
);

/// Directories stale generator installs leave behind in the image
const STALE_INSTALLS: &[&str] = &["/artman", "/googleapis", "/toolkit"];

/// Rewrites local input repositories to their guest mount points
#[must_use]
pub fn stage(config: &SourcesGenerationConfig, guest: &GuestPaths) -> (SourcesGenerationConfig, Vec<Mount>) {
    let mut staged = config.clone();
    let mut mounts = Vec::new();
    for repo in [&mut staged.artman, &mut staged.toolkit, &mut staged.googleapis] {
        if let Some(mount) = repository::local_mount(repo, guest) {
            repo.git_repo.clone_from(&mount.guest);
            mounts.push(mount);
        }
    }
    (staged, mounts)
}

/// Guest half of the step
///
/// # Errors
///
/// Returns the first failing command's error.
pub fn run_guest(config: &SourcesGenerationConfig, ctx: &mut GuestContext<'_>) -> Result<(), StepError> {
    let artman = ctx.checkout_input_repo(&config.artman)?;
    let toolkit = ctx.checkout_input_repo(&config.toolkit)?;
    let googleapis = ctx.checkout_input_repo(&config.googleapis)?;

    reinstall_generator(config, ctx, &artman, &toolkit)?;

    let artifacts = ctx.paths().output_subpath(&[ARTIFACTS_DIR]);
    for api in &config.artman_client_yaml_configs {
        generate(config, ctx, api, &artman, &googleapis, &artifacts)?;
    }

    fix_generator_output(ctx, &artifacts)?;
    archive_artifacts(ctx)
}

fn reinstall_generator(
    config: &SourcesGenerationConfig,
    ctx: &mut GuestContext<'_>,
    artman: &str,
    toolkit: &str,
) -> Result<(), StepError> {
    ctx.run(GuestCommand::new([
        "pip3",
        "uninstall",
        "--yes",
        "-q",
        "googleapis-artman",
    ]))?;
    ctx.run(GuestCommand::new(["pip3", "install", "-q", "-e", artman]))?;
    for dir in STALE_INSTALLS {
        ctx.run(GuestCommand::new(["rm", "-rf", *dir]))?;
    }

    let mut local = Mapping::new();
    local.insert("toolkit".into(), toolkit.into());
    let mut user_config = Mapping::new();
    user_config.insert("local".into(), Value::Mapping(local));

    let path = Path::new(&config.artman_user_config);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    ctx.log(
        LogLevel::Info,
        format!("Writing generator config {}", config.artman_user_config),
    )?;
    config_channel::write(&Value::Mapping(user_config), ConfigSink::Path(path))
}

fn generate(
    config: &SourcesGenerationConfig,
    ctx: &mut GuestContext<'_>,
    api: &ApiTarget,
    artman: &str,
    googleapis: &str,
    artifacts: &str,
) -> Result<(), StepError> {
    let client_config = ctx.paths().root_subpath(&[api.path.as_str()]);

    let mut argv = vec![
        "python3".to_string(),
        "-m".to_string(),
        "artman.cli.main".to_string(),
        "--root-dir".to_string(),
        googleapis.to_string(),
        "--config".to_string(),
        client_config,
        "--output-dir".to_string(),
        artifacts.to_string(),
        "--local".to_string(),
    ];
    if config.debug_mode {
        argv.push("-v".to_string());
    }
    argv.extend(api.actions());

    ctx.log(LogLevel::Info, format!("\n> Generating API {}", api.api_name()))?;
    tracing::info!(api = %api.api_name(), execution_id = %config.execution_id, "Generating API");
    ctx.run(GuestCommand::new(argv).in_dir(artman))
}

fn fix_generator_output(ctx: &mut GuestContext<'_>, artifacts: &str) -> Result<(), StepError> {
    let (from, to) = LONGRUNNING_RENAME;
    let source = format!("{artifacts}/{from}");
    if !Path::new(&source).exists() {
        return Ok(());
    }
    let target = format!("{artifacts}/{to}");
    ctx.run(GuestCommand::new(["mv", source.as_str(), target.as_str()]))
}

/// The archive is written under a temporary name and renamed once complete,
/// so its presence always means a finished run
fn archive_artifacts(ctx: &mut GuestContext<'_>) -> Result<(), StepError> {
    let output = ctx.paths().output_dir();
    let partial = format!("{ARTIFACT_ARCHIVE}.partial");
    ctx.run(
        GuestCommand::new([
            "tar",
            "-pzcf",
            partial.as_str(),
            "--remove-files",
            "-C",
            ARTIFACTS_DIR,
            ".",
        ])
        .in_dir(output.as_str()),
    )?;

    let staged = ctx.paths().output_subpath(&[partial.as_str()]);
    let archive = ctx.paths().output_subpath(&[ARTIFACT_ARCHIVE]);
    ctx.change_ownership(&staged)?;
    ctx.log(LogLevel::Command, format!("mv {partial} {ARTIFACT_ARCHIVE}"))?;
    fs::rename(&staged, &archive).map_err(|e| StepError::Io(format!("cannot publish '{archive}': {e}")))
}
