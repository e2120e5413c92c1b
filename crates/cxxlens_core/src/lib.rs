//! # cxxlens_core
//!
//! Runs external C/C++ static-analysis tools and merges their findings.
//!
//! This crate provides:
//! - Tool adapters that build each tool's command line and parse its output
//! - A process runner with timeouts and cancellation
//! - The `Analyzer` orchestrator, which runs all tools concurrently and
//!   delivers one report per file
//! - The modified-lines diff filter
//! - Configuration loading and source discovery
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cxxlens_core::{AnalysisRequest, Analyzer, AnalyzerConfig};
//! use cxxlens_issue::RuleProfile;
//!
//! let config = AnalyzerConfig::from_file(".cxxlens.json")?;
//! let profile = Arc::new(RuleProfile::from_file("profile.json")?);
//! let analyzer = Analyzer::from_config(&config);
//!
//! let report = analyzer.analyze(AnalysisRequest::new("src/main.cpp", profile))?;
//! for issue in &report.issues {
//!     println!("{}:{} {} {}", issue.component, issue.line, issue.rule_id, issue.message);
//! }
//! ```

pub mod adapters;
mod analyzer;
mod config;
pub mod diff;
mod error;
pub mod runner;
pub mod source;
pub mod walker;

pub use adapters::{Adapter, ParseOutcome, SkippedEntry, ToolAdapter, ToolKind};
pub use analyzer::{
    AnalysisHandle, AnalysisReport, AnalysisRequest, Analyzer, ToolReport, ToolStatus,
};
pub use config::{AnalyzerConfig, CustomToolSettings, Environment, ToolSettings, ToolsConfig};
pub use diff::{DiffOutcome, EditScript};
pub use error::{AnalysisError, ParseError};
pub use runner::{
    CancellationToken, CommandExecutor, CommandSpec, OutputStream, ProcessOutput, SystemExecutor,
};
pub use walker::{SourceWalker, WalkOptions};
