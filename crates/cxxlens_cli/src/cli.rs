//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// cxxlens - runs external C/C++ analyzers and filters their findings through a rule profile
#[derive(Parser)]
#[command(name = "cxxlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze C/C++ sources with the configured tools
    Analyze {
        /// Files or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Rule profile (overrides the config)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Reference version of the analyzed file, for --modified-lines-only
        #[arg(long, value_name = "FILE")]
        reference: Option<PathBuf>,

        /// Only report issues on lines that differ from the reference
        #[arg(long)]
        modified_lines_only: bool,

        /// Run only these tools (cppcheck, rats, vera++, pclint, other)
        #[arg(short, long = "tool", value_name = "KEY")]
        tools: Vec<String>,

        /// Project key used to build `projectKey:relative/path` components
        #[arg(long)]
        project_key: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show the command line each enabled tool would run
    Tools {
        /// File to build the command lines for
        #[arg(default_value = "example.cpp")]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
