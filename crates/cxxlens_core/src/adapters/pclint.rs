use std::path::Path;

use cxxlens_issue::Issue;

use super::scan::scan_bracketed;
use super::{ParseOutcome, ToolAdapter, ToolKind, base_command};
use crate::config::ToolSettings;
use crate::runner::CommandSpec;

/// Message format PC-lint is told to emit, matching the bracketed grammar.
const FORMAT_OPTION: &str = "-format=%(%F(%l):%) error : (%t -- %m) : [%n]";

/// Option files loaded ahead of the configured arguments.
const OPTION_FILES: [&str; 3] = ["+ffn", "std.lnt", "env-vc10.lnt"];

/// PC-lint adapter.
#[derive(Debug, Clone)]
pub struct PcLintAdapter {
    settings: ToolSettings,
}

impl PcLintAdapter {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    fn leading_arguments(&self) -> Vec<String> {
        let mut args = vec![FORMAT_OPTION.to_string()];

        // Lint's own option files live next to the executable.
        if let Some(parent) = self.settings.executable.parent()
            && !parent.as_os_str().is_empty()
        {
            args.push(format!("-i{}", parent.display()));
        }

        args.extend(OPTION_FILES.iter().map(|s| s.to_string()));
        args
    }
}

impl ToolAdapter for PcLintAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::PcLint
    }

    fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    fn build_command(&self, file: &Path) -> CommandSpec {
        base_command(&self.settings, self.leading_arguments(), file)
    }

    fn parse(&self, lines: &[String]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for line in lines {
            match scan_bracketed(line) {
                Ok(found) => outcome.issues.push(Issue::new(
                    self.kind().rule_id(found.id),
                    found.message,
                    found.line,
                    found.file,
                )),
                Err(reason) => outcome.skip(self.kind(), line.as_str(), reason),
            }
        }

        outcome
    }
}
