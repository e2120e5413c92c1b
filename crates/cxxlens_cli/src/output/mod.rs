//! Output formatting module

mod json;
mod text;

use cxxlens_core::AnalysisReport;
use miette::Result;

use crate::cli::OutputFormat;

/// Prints the reports and returns whether any issue was found.
pub fn output_reports(reports: &[AnalysisReport], format: OutputFormat) -> Result<bool> {
    let has_issues = reports.iter().any(|r| r.has_issues());

    match format {
        OutputFormat::Json => json::output_json(reports)?,
        OutputFormat::Text => text::output_text(reports),
    }

    Ok(has_issues)
}
