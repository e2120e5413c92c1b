//! Analyze command implementation

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::{IntoDiagnostic, Result, miette};
use tracing::{info, warn};

use cxxlens_core::source::component_key;
use cxxlens_core::{
    Adapter, AnalysisRequest, Analyzer, AnalyzerConfig, SourceWalker, SystemExecutor,
    ToolAdapter, ToolKind, WalkOptions,
};
use cxxlens_issue::RuleProfile;

use super::load_config;
use crate::cli::{Cli, OutputFormat};
use crate::output::output_reports;

pub struct AnalyzeArgs<'a> {
    pub paths: &'a [PathBuf],
    pub profile: Option<&'a Path>,
    pub reference: Option<&'a Path>,
    pub modified_lines_only: bool,
    pub tools: &'a [String],
    pub project_key: Option<&'a str>,
    pub format: OutputFormat,
}

pub fn run_analyze(cli: &Cli, args: AnalyzeArgs<'_>) -> Result<bool> {
    let mut config = load_config(cli)?;
    if args.modified_lines_only {
        config.modified_lines_only = true;
    }
    if let Some(key) = args.project_key {
        config.project_key = Some(key.to_string());
    }

    let adapters = select_adapters(&config, args.tools)?;
    if adapters.is_empty() {
        return Err(miette!(
            "No tools enabled. Configure them in {} (see `cxxlens init`).",
            AnalyzerConfig::CONFIG_FILES[0]
        ));
    }

    let profile_path = args
        .profile
        .map(Path::to_path_buf)
        .or_else(|| config.profile.clone())
        .ok_or_else(|| {
            miette!("No rule profile given. Pass --profile or set \"profile\" in the config.")
        })?;
    let profile = Arc::new(RuleProfile::from_file(&profile_path).into_diagnostic()?);
    info!(
        "Using profile: {} ({} rules)",
        profile_path.display(),
        profile.len()
    );

    let files = SourceWalker::new(WalkOptions::from_config(&config)).walk(args.paths);

    let reference = match args.reference {
        Some(path) => {
            if files.len() > 1 {
                return Err(miette!(
                    "--reference applies to a single file, but {} files were found",
                    files.len()
                ));
            }
            Some(fs::read_to_string(path).into_diagnostic()?)
        }
        None => None,
    };
    if config.modified_lines_only && reference.is_none() {
        warn!("No reference given, reporting issues on all lines");
    }

    let root = match &config.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().into_diagnostic()?,
    };

    let requests = files
        .iter()
        .map(|file| {
            let mut request = AnalysisRequest::new(file, Arc::clone(&profile))
                .modified_lines_only(config.modified_lines_only);
            if let Some(reference) = &reference {
                request = request.with_reference(reference.clone());
            }
            if let Some(key) = config
                .project_key
                .as_deref()
                .and_then(|project| component_key(project, &root, file))
            {
                request = request.with_component_key(key);
            }
            request
        })
        .collect();

    let analyzer = Analyzer::new(adapters, Arc::new(SystemExecutor::new()));
    let (mut reports, failures) = analyzer.analyze_files(requests);
    reports.sort_by(|a, b| a.file.cmp(&b.file));

    if !failures.is_empty() {
        eprintln!("\n{} file(s) failed to analyze:", failures.len());
        for (path, error) in &failures {
            eprintln!("  {}: {}", path.display(), error);
        }
    }

    let has_issues = output_reports(&reports, args.format)?;

    Ok(has_issues || !failures.is_empty())
}

/// Enabled adapters, narrowed to the requested tools if any were named.
pub fn select_adapters(config: &AnalyzerConfig, tools: &[String]) -> Result<Vec<Adapter>> {
    let adapters = config.adapters();
    if tools.is_empty() {
        return Ok(adapters);
    }

    let requested = tools
        .iter()
        .map(|t| t.parse::<ToolKind>())
        .collect::<Result<Vec<_>, _>>()
        .into_diagnostic()?;

    for kind in &requested {
        if !adapters.iter().any(|a| a.kind() == *kind) {
            warn!("Tool '{}' is not configured or disabled", kind);
        }
    }

    Ok(adapters
        .into_iter()
        .filter(|a| requested.contains(&a.kind()))
        .collect())
}
