//! cxxlens CLI
//!
//! Runs cppcheck, RATS, vera++, PC-lint and custom analyzers over C/C++ sources.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{AnalyzeArgs, run_analyze, run_init, run_tools};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(has_issues) => {
            if has_issues {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Analyze {
            paths,
            profile,
            reference,
            modified_lines_only,
            tools,
            project_key,
            format,
        } => run_analyze(
            &cli,
            AnalyzeArgs {
                paths,
                profile: profile.as_deref(),
                reference: reference.as_deref(),
                modified_lines_only: *modified_lines_only,
                tools,
                project_key: project_key.as_deref(),
                format: *format,
            },
        ),
        Commands::Init { force } => run_init(*force).map(|_| false),
        Commands::Tools { file } => run_tools(&cli, file).map(|_| false),
    }
}
