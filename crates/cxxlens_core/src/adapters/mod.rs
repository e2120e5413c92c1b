//! Tool adapters.
//!
//! Each adapter knows how to invoke one external analysis tool and how to read
//! that tool's output grammar back into [`Issue`]s. The set of tools is closed:
//! [`Adapter`] wraps the concrete adapters and dispatches on its variant.

mod cppcheck;
mod custom;
mod pclint;
mod rats;
mod scan;
mod vera;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use cxxlens_issue::Issue;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ToolSettings;
use crate::error::{AnalysisError, ParseError};
use crate::runner::{CommandSpec, OutputStream, split_arguments};

pub use cppcheck::CppCheckAdapter;
pub use custom::CustomAdapter;
pub use pclint::PcLintAdapter;
pub use rats::RatsAdapter;
pub use vera::VeraAdapter;

/// The supported external tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolKind {
    #[serde(rename = "cppcheck")]
    CppCheck,
    #[serde(rename = "rats")]
    Rats,
    #[serde(rename = "vera++")]
    Vera,
    #[serde(rename = "pclint")]
    PcLint,
    #[serde(rename = "other")]
    Custom,
}

impl ToolKind {
    /// Every tool, in launch order.
    pub const ALL: [ToolKind; 5] = [
        ToolKind::CppCheck,
        ToolKind::Rats,
        ToolKind::Vera,
        ToolKind::PcLint,
        ToolKind::Custom,
    ];

    /// Repository key; every rule id of this tool starts with it.
    pub fn key(self) -> &'static str {
        match self {
            ToolKind::CppCheck => "cppcheck",
            ToolKind::Rats => "rats",
            ToolKind::Vera => "vera++",
            ToolKind::PcLint => "pclint",
            ToolKind::Custom => "other",
        }
    }

    /// Separator between the repository key and the tool's rule code.
    ///
    /// Existing profiles are keyed with these exact separators.
    pub fn separator(self) -> char {
        match self {
            ToolKind::Vera | ToolKind::PcLint => ':',
            ToolKind::CppCheck | ToolKind::Rats | ToolKind::Custom => '.',
        }
    }

    /// Builds a namespaced rule id.
    pub fn rule_id(self, code: &str) -> String {
        format!("{}{}{}", self.key(), self.separator(), code)
    }

    /// Stream that carries findings when the settings don't say otherwise.
    pub fn default_stream(self) -> OutputStream {
        match self {
            ToolKind::CppCheck | ToolKind::Rats => OutputStream::Stdout,
            ToolKind::Vera | ToolKind::PcLint | ToolKind::Custom => OutputStream::Stderr,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ToolKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(s.trim()))
            .or(match s.trim().to_ascii_lowercase().as_str() {
                "vera" => Some(ToolKind::Vera),
                "custom" => Some(ToolKind::Custom),
                _ => None,
            })
            .ok_or_else(|| AnalysisError::config(format!("Unknown tool: {}", s)))
    }
}

/// A line or record of tool output that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// The offending line, or a short description of the record.
    pub entry: String,
    /// Why it was rejected.
    pub reason: ParseError,
}

/// Result of parsing one tool's output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Successfully converted issues.
    pub issues: Vec<Issue>,
    /// Entries that were rejected.
    pub skipped: Vec<SkippedEntry>,
}

impl ParseOutcome {
    pub(crate) fn skip(&mut self, tool: ToolKind, entry: impl Into<String>, reason: ParseError) {
        let entry = entry.into();
        warn!("[{}] skipped '{}': {}", tool, entry, reason);
        self.skipped.push(SkippedEntry { entry, reason });
    }
}

/// Contract shared by every tool adapter.
pub trait ToolAdapter {
    /// Which tool this adapter drives.
    fn kind(&self) -> ToolKind;

    /// The settings the command line is built from.
    fn settings(&self) -> &ToolSettings;

    /// Builds the command line that analyzes `file`.
    fn build_command(&self, file: &Path) -> CommandSpec {
        base_command(self.settings(), Vec::new(), file)
    }

    /// Converts captured output lines into issues.
    ///
    /// Never fails as a whole; rejected lines end up in [`ParseOutcome::skipped`].
    fn parse(&self, lines: &[String]) -> ParseOutcome;

    /// Stream whose lines are handed to [`ToolAdapter::parse`].
    fn output_stream(&self) -> OutputStream {
        self.settings()
            .stream
            .unwrap_or_else(|| self.kind().default_stream())
    }

    /// Repository key of the tool.
    fn key(&self) -> &'static str {
        self.kind().key()
    }
}

/// Builds a command from settings: `leading` arguments, then the configured
/// argument string, then the absolute path of `file`.
pub(crate) fn base_command(
    settings: &ToolSettings,
    leading: Vec<String>,
    file: &Path,
) -> CommandSpec {
    let file = std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf());

    CommandSpec::new(settings.executable.clone())
        .args(leading)
        .args(split_arguments(&settings.arguments))
        .arg(file.display().to_string())
        .envs(settings.environment.to_map())
        .working_dir(settings.working_dir.clone())
        .timeout(settings.timeout())
}

/// One adapter per supported tool.
#[derive(Debug, Clone)]
pub enum Adapter {
    CppCheck(CppCheckAdapter),
    Rats(RatsAdapter),
    Vera(VeraAdapter),
    PcLint(PcLintAdapter),
    Custom(CustomAdapter),
}

impl Adapter {
    /// Creates the adapter for `kind`.
    ///
    /// `custom_key` only applies to [`ToolKind::Custom`].
    pub fn new(kind: ToolKind, settings: ToolSettings, custom_key: Option<String>) -> Self {
        match kind {
            ToolKind::CppCheck => Adapter::CppCheck(CppCheckAdapter::new(settings)),
            ToolKind::Rats => Adapter::Rats(RatsAdapter::new(settings)),
            ToolKind::Vera => Adapter::Vera(VeraAdapter::new(settings)),
            ToolKind::PcLint => Adapter::PcLint(PcLintAdapter::new(settings)),
            ToolKind::Custom => Adapter::Custom(CustomAdapter::new(settings, custom_key)),
        }
    }

    fn inner(&self) -> &dyn ToolAdapter {
        match self {
            Adapter::CppCheck(a) => a,
            Adapter::Rats(a) => a,
            Adapter::Vera(a) => a,
            Adapter::PcLint(a) => a,
            Adapter::Custom(a) => a,
        }
    }
}

impl ToolAdapter for Adapter {
    fn kind(&self) -> ToolKind {
        self.inner().kind()
    }

    fn settings(&self) -> &ToolSettings {
        self.inner().settings()
    }

    fn build_command(&self, file: &Path) -> CommandSpec {
        self.inner().build_command(file)
    }

    fn parse(&self, lines: &[String]) -> ParseOutcome {
        self.inner().parse(lines)
    }

    fn output_stream(&self) -> OutputStream {
        self.inner().output_stream()
    }
}
