//! JSON output formatter

use cxxlens_core::AnalysisReport;
use miette::{IntoDiagnostic, Result};

pub fn output_json(reports: &[AnalysisReport]) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(reports).into_diagnostic()?
    );
    Ok(())
}
