//! Command-line interface
//!
//! - `host`: stage a workspace and launch a step's guest container
//! - `guest`: run a step's guest half (the container entry point)
//! - `status`: report the status of an execution
//! - `log`: print an execution's log
//! - `completions`: generate shell completions

pub mod completions;
pub mod guest;
pub mod host;
pub mod inspect;

use anyhow::{Context, Result};
use artmanflow::infrastructure::Config;
use artmanflow::infrastructure::config_channel::ConfigSource;
use artmanflow::step::StepKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for artmanflow
#[derive(Parser, Debug)]
#[command(name = "artmanflow")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stage a workspace and launch the step's guest container
    Host {
        /// Step to run
        #[arg(value_enum)]
        step: StepArg,
        /// Configuration file (stdin when no configuration is given)
        config: Option<PathBuf>,
        /// Configuration file, takes precedence over the positional path
        #[arg(long = "config", value_name = "PATH")]
        config_path: Option<PathBuf>,
        /// Configuration as YAML text, takes precedence over files
        #[arg(long)]
        config_text: Option<String>,
        /// Wait for the container to exit
        #[arg(short, long)]
        wait: bool,
    },

    /// Run the step's guest half; used as the container command
    Guest {
        /// Step to run
        #[arg(value_enum)]
        step: StepArg,
        /// Configuration file (stdin if not specified)
        config: Option<PathBuf>,
    },

    /// Report the status of an execution
    Status {
        /// Step the execution belongs to
        #[arg(value_enum)]
        step: StepArg,
        /// Execution id printed by `host`
        execution_id: String,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the log of an execution
    Log {
        /// Step the execution belongs to
        #[arg(value_enum)]
        step: StepArg,
        /// Execution id printed by `host`
        execution_id: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = LogFormatArg::Ansi)]
        format: LogFormatArg,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StepArg {
    SourcesGeneration,
    JavaSourcesStaging,
}

impl From<StepArg> for StepKind {
    fn from(step: StepArg) -> Self {
        match step {
            StepArg::SourcesGeneration => StepKind::SourcesGeneration,
            StepArg::JavaSourcesStaging => StepKind::JavaSourcesStaging,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Ansi,
    Plain,
    Html,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Host {
            step,
            config,
            config_path,
            config_text,
            wait,
        } => {
            let settings = load_config()?.host_settings();
            let source = ConfigSource::resolve(config_text, config_path, config);
            let outcome = host::run_host(step.into(), &source, &settings, wait)?;
            println!("{}", outcome.execution_id);
            if let Some(code) = outcome.exit_code {
                anyhow::ensure!(code == 0, "guest exited with code {code}");
            }
        }
        Command::Guest { step, config } => {
            guest::run_guest(step.into(), &ConfigSource::resolve(None, None, config))?;
        }
        Command::Status {
            step,
            execution_id,
            json,
        } => {
            let settings = load_config()?.host_settings();
            let report = inspect::status(step.into(), &execution_id, &settings)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.status);
            }
        }
        Command::Log {
            step,
            execution_id,
            format,
        } => {
            let settings = load_config()?.host_settings();
            let format = match format {
                LogFormatArg::Ansi => inspect::LogOutput::Ansi,
                LogFormatArg::Plain => inspect::LogOutput::Plain,
                LogFormatArg::Html => inspect::LogOutput::Html,
            };
            print!("{}", inspect::log(step.into(), &execution_id, &settings, format)?);
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{}", completions);
            }
        }
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    Config::from_env().context("Invalid ARTMANFLOW_* environment")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_arguments() {
        let args = Args::try_parse_from([
            "artmanflow",
            "host",
            "sources-generation",
            "step.yaml",
            "--config-text",
            "docker_image: img",
            "--wait",
        ])
        .unwrap();

        let Command::Host {
            step,
            config,
            config_path,
            config_text,
            wait,
        } = args.command
        else {
            panic!("expected host command");
        };
        assert_eq!(step, StepArg::SourcesGeneration);
        assert_eq!(config, Some(PathBuf::from("step.yaml")));
        assert_eq!(config_path, None);
        assert_eq!(config_text.as_deref(), Some("docker_image: img"));
        assert!(wait);
    }

    #[test]
    fn test_guest_step_slugs_match_kinds() {
        for kind in StepKind::ALL {
            let args = Args::try_parse_from(["artmanflow", "guest", kind.slug()]).unwrap();
            let Command::Guest { step, config } = args.command else {
                panic!("expected guest command");
            };
            assert_eq!(StepKind::from(step), kind);
            assert_eq!(config, None);
        }
    }

    #[test]
    fn test_log_format_default() {
        let args =
            Args::try_parse_from(["artmanflow", "log", "java-sources-staging", "java-src-stage-1"])
                .unwrap();
        assert!(matches!(
            args.command,
            Command::Log {
                format: LogFormatArg::Ansi,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(Args::try_parse_from(["artmanflow", "guest", "python-staging"]).is_err());
    }

    #[test]
    fn test_cli_is_well_formed() {
        build_cli().debug_assert();
    }
}
