//! Tools command implementation

use std::path::Path;

use cxxlens_core::{OutputStream, ToolAdapter};
use miette::Result;

use super::load_config;
use crate::cli::Cli;

pub fn run_tools(cli: &Cli, file: &Path) -> Result<()> {
    let config = load_config(cli)?;
    let adapters = config.adapters();

    if adapters.is_empty() {
        println!("No tools enabled.");
        return Ok(());
    }

    for adapter in &adapters {
        let spec = adapter.build_command(file);
        let stream = match adapter.output_stream() {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        };

        println!("{} (reads {}):", adapter.key(), stream);
        println!("  {}", spec.command_line());
        for (key, value) in &spec.env {
            println!("  env {}={}", key, value);
        }
        if let Some(dir) = &spec.working_dir {
            println!("  cwd {}", dir.display());
        }
        if let Some(timeout) = spec.timeout {
            println!("  timeout {:?}", timeout);
        }
    }

    Ok(())
}
