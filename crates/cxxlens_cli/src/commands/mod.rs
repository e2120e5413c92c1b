//! Subcommand implementations

mod analyze;
mod init;
mod tools;

pub use analyze::{AnalyzeArgs, run_analyze};
pub use init::run_init;
pub use tools::run_tools;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use cxxlens_core::AnalyzerConfig;

use crate::cli::Cli;

/// Loads the config named on the command line, or the one in the working directory.
pub fn load_config(cli: &Cli) -> Result<AnalyzerConfig> {
    if let Some(path) = &cli.config {
        return AnalyzerConfig::from_file(path).into_diagnostic();
    }

    if let Some(path) = AnalyzerConfig::discover(".") {
        info!("Using config: {}", path.display());
        return AnalyzerConfig::from_file(&path).into_diagnostic();
    }

    info!("No config file found, no tools configured");
    Ok(AnalyzerConfig::new())
}
