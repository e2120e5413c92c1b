//! Text output formatter

use cxxlens_core::{AnalysisReport, DiffOutcome, ToolStatus};

pub fn output_text(reports: &[AnalysisReport]) {
    for report in reports {
        for tool in report.failed_tools() {
            let reason = match &tool.status {
                ToolStatus::Failed { reason } => reason.as_str(),
                ToolStatus::TimedOut => "timed out",
                ToolStatus::Cancelled => "cancelled",
                ToolStatus::Completed { .. } => continue,
            };
            eprintln!("{}: {} did not complete: {}", report.file.display(), tool.tool, reason);
        }

        if let DiffOutcome::Skipped { reason } = &report.diff {
            eprintln!("{}: modified-lines filter skipped: {}", report.file.display(), reason);
        }

        if report.issues.is_empty() {
            continue;
        }

        println!("\n{}:", report.file.display());
        for issue in &report.issues {
            let severity = issue.severity.map(|s| s.as_str()).unwrap_or("-");
            println!(
                "  {} {} [{}]: {}",
                issue.line, severity, issue.rule_id, issue.message
            );
        }
    }

    let total_files = reports.len();
    let total_issues: usize = reports.iter().map(|r| r.issues.len()).sum();

    println!();
    println!(
        "Analyzed {} files, found {} issues",
        total_files, total_issues
    );
}
