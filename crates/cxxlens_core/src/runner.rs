//! External process execution.
//!
//! This module provides the `CommandExecutor` trait which abstracts how an
//! external analysis tool is launched, so that adapters and the analyzer can be
//! driven by a real process runner in production and by canned output in tests.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::AnalysisError;

/// Which output stream of a tool carries its findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// A fully resolved command line for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable to run.
    pub program: PathBuf,
    /// Arguments, the analyzed file last.
    pub args: Vec<String>,
    /// Variables added to the inherited environment of the child only.
    pub env: BTreeMap<String, String>,
    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,
    /// Time limit after which the child is killed.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            timeout: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replaces the environment map.
    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Sets the working directory.
    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Sets the time limit.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Renders the command line for logs and listings.
    pub fn command_line(&self) -> String {
        let mut rendered = quote(&self.program.display().to_string());
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&quote(arg));
        }
        rendered
    }
}

fn quote(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// Splits an argument string the way the tool settings are written.
///
/// Arguments are separated by whitespace; double quotes group characters
/// (including whitespace) into one argument and are removed.
pub fn split_arguments(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        args.push(current);
    }

    args
}

/// Captured output of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Non-empty stdout lines.
    pub stdout: Vec<String>,
    /// Non-empty stderr lines.
    pub stderr: Vec<String>,
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Returns the lines of the given stream.
    pub fn lines(&self, stream: OutputStream) -> &[String] {
        match stream {
            OutputStream::Stdout => &self.stdout,
            OutputStream::Stderr => &self.stderr,
        }
    }
}

/// Cooperative cancellation flag shared between a run and its tool processes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Trait for launching an external tool and capturing its output.
///
/// Implementations block until the tool exits, is cancelled, or times out.
pub trait CommandExecutor: Send + Sync {
    /// Runs the command and captures both output streams.
    fn execute(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, AnalysisError>;
}

/// `CommandExecutor` backed by `std::process::Command`.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    poll_interval: Duration,
}

impl SystemExecutor {
    /// Creates an executor with the default polling interval.
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
        }
    }

    /// Sets how often a running child is checked for exit, timeout and cancellation.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, AnalysisError> {
        let program = spec.program.display().to_string();

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so the whole tree can be killed at once.
            command.process_group(0);
        }

        debug!("Executing: {}", spec.command_line());
        let mut child = command
            .spawn()
            .map_err(|e| AnalysisError::launch(&program, e))?;

        let pid = child.id();
        let stdout_reader = child.stdout.take().map(spawn_line_reader);
        let stderr_reader = child.stderr.take().map(spawn_line_reader);

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Ok(status),
                Ok(None) => {}
                Err(e) => {
                    kill_tree(&mut child);
                    break Err(AnalysisError::Io(e));
                }
            }

            if cancel.is_cancelled() {
                kill_tree(&mut child);
                break Err(AnalysisError::Cancelled(program.clone()));
            }

            if let Some(limit) = spec.timeout
                && started.elapsed() >= limit
            {
                warn!("'{}' exceeded {:?}, killing it", program, limit);
                kill_tree(&mut child);
                break Err(AnalysisError::Timeout(program.clone()));
            }

            thread::sleep(self.poll_interval);
        };

        // Descendants left behind would hold the pipes open until they exit.
        kill_group(pid);

        let stdout = join_line_reader(stdout_reader);
        let stderr = join_line_reader(stderr_reader);
        let status = status?;

        debug!(
            "'{}' finished with {:?} after {:?}",
            program,
            status.code(),
            started.elapsed()
        );

        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(pipe: R) -> JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                }
                Err(e) => {
                    debug!("Output pipe read failed: {}", e);
                    break;
                }
            }
        }
        lines
    })
}

fn join_line_reader(handle: Option<JoinHandle<Vec<String>>>) -> Vec<String> {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

/// Kills every process left in the group led by `pid`.
fn kill_group(pid: u32) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(pid) {
            // SAFETY: kill(2) has no memory-safety preconditions; the negative pid
            // addresses the process group the child was placed in at spawn.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

fn kill_tree(child: &mut Child) {
    kill_group(child.id());
    let _ = child.kill();
    let _ = child.wait();
}
