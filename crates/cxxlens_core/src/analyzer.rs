//! Concurrent analysis of one file by every configured tool.
//!
//! [`Analyzer::spawn`] starts one worker thread per adapter. Each worker runs
//! its tool, parses the output and correlates the issues with the analyzed
//! file and the rule profile without holding any lock; only the final merge
//! into the shared [`AnalysisRun`] is serialized. The worker that settles the
//! last slot assembles the [`AnalysisReport`] and delivers it exactly once.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};
use cxxlens_issue::{Issue, RuleProfile};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::adapters::{Adapter, ToolAdapter, ToolKind};
use crate::config::AnalyzerConfig;
use crate::diff::{DiffOutcome, filter_modified_lines};
use crate::error::AnalysisError;
use crate::runner::{CancellationToken, CommandExecutor, OutputStream, SystemExecutor};
use crate::source::same_file;

/// What to analyze and how to filter the result.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// File handed to every tool.
    pub file: PathBuf,
    /// Active rule profile. Issues whose rule is missing or disabled are dropped.
    pub profile: Arc<RuleProfile>,
    /// Keep only issues on lines changed relative to `reference_source`.
    pub modified_lines_only: bool,
    /// Reference snapshot of the file (for example the last committed version).
    pub reference_source: Option<String>,
    /// Component written into every issue. Defaults to the analyzed path.
    pub component_key: Option<String>,
}

impl AnalysisRequest {
    pub fn new(file: impl Into<PathBuf>, profile: Arc<RuleProfile>) -> Self {
        Self {
            file: file.into(),
            profile,
            modified_lines_only: false,
            reference_source: None,
            component_key: None,
        }
    }

    pub fn modified_lines_only(mut self, enabled: bool) -> Self {
        self.modified_lines_only = enabled;
        self
    }

    pub fn with_reference(mut self, source: impl Into<String>) -> Self {
        self.reference_source = Some(source.into());
        self
    }

    pub fn with_component_key(mut self, key: impl Into<String>) -> Self {
        self.component_key = Some(key.into());
        self
    }

    fn component(&self) -> String {
        self.component_key
            .clone()
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

/// How one tool's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ToolStatus {
    /// The tool ran to completion. Its exit code is informational only.
    Completed { exit_code: Option<i32> },
    /// The tool could not be launched or its worker failed.
    Failed { reason: String },
    /// The tool exceeded its time limit and was killed.
    TimedOut,
    /// The run was cancelled while the tool was running.
    Cancelled,
}

/// Per-tool summary of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolReport {
    pub tool: ToolKind,
    pub status: ToolStatus,
    /// Issues parsed from the tool's output.
    pub reported: usize,
    /// Issues left after path correlation and profile resolution.
    pub kept: usize,
    /// Output lines or records that could not be parsed.
    pub skipped: usize,
}

impl ToolReport {
    fn new(tool: ToolKind, status: ToolStatus) -> Self {
        Self {
            tool,
            status,
            reported: 0,
            kept: 0,
            skipped: 0,
        }
    }
}

/// Result of analyzing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub file: PathBuf,
    /// Issues sorted by line, rule id and message.
    pub issues: Vec<Issue>,
    /// One entry per adapter, in adapter order.
    pub tools: Vec<ToolReport>,
    pub diff: DiffOutcome,
}

impl AnalysisReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Tools that did not complete.
    pub fn failed_tools(&self) -> impl Iterator<Item = &ToolReport> {
        self.tools
            .iter()
            .filter(|t| !matches!(t.status, ToolStatus::Completed { .. }))
    }
}

/// Runs every configured tool against a file.
#[derive(Clone)]
pub struct Analyzer {
    adapters: Arc<Vec<Adapter>>,
    executor: Arc<dyn CommandExecutor>,
}

impl Analyzer {
    pub fn new(adapters: Vec<Adapter>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            adapters: Arc::new(adapters),
            executor,
        }
    }

    /// Creates an analyzer for the enabled tools of `config`, launching real processes.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.adapters(), Arc::new(SystemExecutor::new()))
    }

    pub fn adapters(&self) -> &[Adapter] {
        &self.adapters
    }

    /// Starts analyzing `request.file` and returns immediately.
    ///
    /// The report arrives on [`AnalysisHandle::completion`] once every tool
    /// has settled, whether it succeeded, failed, timed out or was cancelled.
    pub fn spawn(&self, request: AnalysisRequest) -> AnalysisHandle {
        let (sender, receiver) = bounded(1);
        let cancel = CancellationToken::new();
        let file = request.file.clone();

        let run = Arc::new(AnalysisRun {
            state: Mutex::new(RunState {
                issues: Vec::new(),
                tools: vec![None; self.adapters.len()],
                remaining: self.adapters.len(),
            }),
            request,
            completion: sender,
        });

        debug!(
            "Analyzing {} with {} tool(s)",
            file.display(),
            self.adapters.len()
        );

        if self.adapters.is_empty() {
            run.complete(Vec::new(), Vec::new());
        }

        for (index, adapter) in self.adapters.iter().enumerate() {
            let worker_run = Arc::clone(&run);
            let adapter = adapter.clone();
            let executor = Arc::clone(&self.executor);
            let worker_cancel = cancel.clone();
            let kind = adapter.kind();

            let spawned = thread::Builder::new()
                .name(format!("cxxlens-{}", kind))
                .spawn(move || {
                    let mut slot = SlotGuard::new(&worker_run, index, kind);
                    let (issues, report) = run_tool(
                        &adapter,
                        executor.as_ref(),
                        &worker_run.request,
                        &worker_cancel,
                    );
                    slot.settle(issues, report);
                });

            if let Err(e) = spawned {
                warn!("[{}] Failed to start worker: {}", kind, e);
                run.settle(
                    index,
                    Vec::new(),
                    ToolReport::new(
                        kind,
                        ToolStatus::Failed {
                            reason: format!("failed to start worker: {}", e),
                        },
                    ),
                );
            }
        }

        AnalysisHandle {
            file,
            cancel,
            completion: receiver,
        }
    }

    /// Analyzes a file and blocks until every tool has settled.
    pub fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        self.spawn(request).wait()
    }

    /// Analyzes several files in parallel.
    ///
    /// Returns the reports of the files that completed and the errors of
    /// those that did not.
    pub fn analyze_files(
        &self,
        requests: Vec<AnalysisRequest>,
    ) -> (Vec<AnalysisReport>, Vec<(PathBuf, AnalysisError)>) {
        let results: Vec<Result<AnalysisReport, (PathBuf, AnalysisError)>> = requests
            .into_par_iter()
            .map(|request| {
                let file = request.file.clone();
                self.analyze(request).map_err(|e| (file, e))
            })
            .collect();

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(report) => successes.push(report),
                Err((path, error)) => {
                    warn!("Failed to analyze {}: {}", path.display(), error);
                    failures.push((path, error));
                }
            }
        }

        (successes, failures)
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("adapters", &self.adapters)
            .finish_non_exhaustive()
    }
}

/// Handle to a running analysis.
#[derive(Debug)]
pub struct AnalysisHandle {
    file: PathBuf,
    cancel: CancellationToken,
    completion: Receiver<AnalysisReport>,
}

impl AnalysisHandle {
    /// Asks every running tool to stop. The report is still delivered.
    pub fn cancel(&self) {
        debug!("Cancelling analysis of {}", self.file.display());
        self.cancel.cancel();
    }

    /// Channel that receives the report exactly once.
    pub fn completion(&self) -> &Receiver<AnalysisReport> {
        &self.completion
    }

    /// Blocks until the report is available.
    pub fn wait(self) -> Result<AnalysisReport, AnalysisError> {
        self.completion.recv().map_err(|_| {
            AnalysisError::Internal(format!(
                "analysis of {} ended without a report",
                self.file.display()
            ))
        })
    }
}

/// Shared state of one analysis.
struct AnalysisRun {
    request: AnalysisRequest,
    state: Mutex<RunState>,
    completion: Sender<AnalysisReport>,
}

struct RunState {
    issues: Vec<Issue>,
    tools: Vec<Option<ToolReport>>,
    remaining: usize,
}

impl AnalysisRun {
    /// Merges one tool's result. The call that settles the last slot completes the run.
    fn settle(&self, index: usize, issues: Vec<Issue>, report: ToolReport) {
        let finished = {
            let mut state = self.state.lock();
            if state.tools[index].is_some() {
                return;
            }
            state.issues.extend(issues);
            state.tools[index] = Some(report);
            state.remaining -= 1;

            (state.remaining == 0).then(|| {
                (
                    std::mem::take(&mut state.issues),
                    state.tools.drain(..).flatten().collect::<Vec<_>>(),
                )
            })
        };

        if let Some((issues, tools)) = finished {
            self.complete(issues, tools);
        }
    }

    fn complete(&self, mut issues: Vec<Issue>, tools: Vec<ToolReport>) {
        issues.sort_by(|a, b| {
            a.line
                .cmp(&b.line)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
                .then_with(|| a.message.cmp(&b.message))
        });

        let diff = if self.request.modified_lines_only {
            filter_modified_lines(
                &mut issues,
                &self.request.file,
                self.request.reference_source.as_deref(),
            )
        } else {
            DiffOutcome::NotRequested
        };

        debug!(
            "Finished {}: {} issue(s)",
            self.request.file.display(),
            issues.len()
        );

        let report = AnalysisReport {
            file: self.request.file.clone(),
            issues,
            tools,
            diff,
        };

        // The receiver may already be gone if the caller dropped the handle.
        if self.completion.try_send(report).is_err() {
            debug!(
                "Nobody is waiting for the report of {}",
                self.request.file.display()
            );
        }
    }
}

/// Settles a tool slot exactly once, even if the worker panics.
struct SlotGuard<'a> {
    run: &'a AnalysisRun,
    index: usize,
    kind: ToolKind,
    settled: bool,
}

impl<'a> SlotGuard<'a> {
    fn new(run: &'a AnalysisRun, index: usize, kind: ToolKind) -> Self {
        Self {
            run,
            index,
            kind,
            settled: false,
        }
    }

    fn settle(&mut self, issues: Vec<Issue>, report: ToolReport) {
        self.settled = true;
        self.run.settle(self.index, issues, report);
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("[{}] Worker ended unexpectedly", self.kind);
            self.run.settle(
                self.index,
                Vec::new(),
                ToolReport::new(
                    self.kind,
                    ToolStatus::Failed {
                        reason: "worker panicked".to_string(),
                    },
                ),
            );
        }
    }
}

/// Runs one tool and turns its output into profile-annotated issues for the analyzed file.
fn run_tool(
    adapter: &Adapter,
    executor: &dyn CommandExecutor,
    request: &AnalysisRequest,
    cancel: &CancellationToken,
) -> (Vec<Issue>, ToolReport) {
    let kind = adapter.kind();
    let spec = adapter.build_command(&request.file);
    debug!("[{}] Launching: {}", kind, spec.command_line());

    let output = match executor.execute(&spec, cancel) {
        Ok(output) => output,
        Err(AnalysisError::Timeout(_)) => {
            warn!("[{}] Timed out on {}", kind, request.file.display());
            return (Vec::new(), ToolReport::new(kind, ToolStatus::TimedOut));
        }
        Err(AnalysisError::Cancelled(_)) => {
            debug!("[{}] Cancelled", kind);
            return (Vec::new(), ToolReport::new(kind, ToolStatus::Cancelled));
        }
        Err(e) => {
            warn!("[{}] Failed on {}: {}", kind, request.file.display(), e);
            return (
                Vec::new(),
                ToolReport::new(
                    kind,
                    ToolStatus::Failed {
                        reason: e.to_string(),
                    },
                ),
            );
        }
    };

    for stream in [OutputStream::Stdout, OutputStream::Stderr] {
        for line in output.lines(stream) {
            trace!("[{}] : {}", kind, line);
        }
    }

    let outcome = adapter.parse(output.lines(adapter.output_stream()));
    let reported = outcome.issues.len();
    let issues = correlate(outcome.issues, request);

    debug!(
        "[{}] Finished with exit code {:?}: {} reported, {} kept, {} skipped",
        kind,
        output.exit_code,
        reported,
        issues.len(),
        outcome.skipped.len()
    );

    let report = ToolReport {
        tool: kind,
        status: ToolStatus::Completed {
            exit_code: output.exit_code,
        },
        reported,
        kept: issues.len(),
        skipped: outcome.skipped.len(),
    };

    (issues, report)
}

/// Keeps issues reported against the analyzed file, rewrites their component
/// and applies the profile.
fn correlate(issues: Vec<Issue>, request: &AnalysisRequest) -> Vec<Issue> {
    let component = request.component();

    issues
        .into_iter()
        .filter(|issue| !issue.component.is_empty() && same_file(&issue.component, &request.file))
        .filter_map(|mut issue| {
            issue.component = component.clone();
            request.profile.annotate(issue)
        })
        .collect()
}
