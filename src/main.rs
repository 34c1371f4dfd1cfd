//! artmanflow - host/guest runner for containerized code generation steps
//!
//! ## Commands
//!
//! - `artmanflow host <STEP> [CONFIG]` - Stage a workspace and launch the guest
//! - `artmanflow guest <STEP> [CONFIG]` - Guest entry point, run inside the container
//! - `artmanflow status <STEP> <ID>` - Report whether an execution finished
//! - `artmanflow log <STEP> <ID>` - Print an execution's log
//! - `artmanflow completions <SHELL>` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch a generation run; prints the execution id
//! artmanflow host sources-generation sources_generation.yaml
//!
//! # Poll it
//! artmanflow status sources-generation src-gen-1a2b3c4d
//! artmanflow log sources-generation src-gen-1a2b3c4d --format plain
//! ```

use anyhow::Result;
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    // Initialize tracing for debugging
    if std::env::var("ARTMANFLOW_DEBUG").is_ok() {
        let level = std::env::var(artmanflow::infrastructure::LOG_VAR)
            .unwrap_or_else(|_| "debug".to_string());
        artmanflow::infrastructure::init_logging(&level);
    }

    report(cli::run())
}

fn report(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("ARTMANFLOW_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
