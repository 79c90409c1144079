//! bulk_extractor run orchestration.
//!
//! Each input file goes through the same states:
//! PREPARE → RUNNING → {SUCCEEDED | FAILED} → CLEANED_UP
//!
//! - PREPARE allocates the report output file and a fresh extraction
//!   directory, and builds `<extractor> -o <dir> [extra args] <input>`
//! - RUNNING blocks until the extractor exits (or the optional timeout fires)
//! - SUCCEEDED requires exit code 0 and the extraction directory on disk; the
//!   report is rendered and every non-empty artifact is packaged
//! - FAILED aborts the whole run; output files already written for this or
//!   earlier inputs are deleted
//! - CLEANED_UP removes the extraction directory on every path
//!
//! Inputs are processed one at a time.

mod run_dir;

pub use run_dir::ExtractionDir;

use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bulkx_protocol::{create_output_file, serialize_file_report, FileReport, InputFile, OutputFile};
use bulkx_report::{generate_summary_report, ReportError, SummaryReport};
use thiserror::Error;

use crate::collector::{extract_non_empty_files, remove_output_files, CollectError};
use crate::config::TaskConfig;

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors from executor operations. All of them abort the task.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to start {program} for '{input}': {source}")]
    SpawnFailed {
        input: String,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("extractor failed on '{input}' ({path}) with {status}")]
    ExtractorFailed {
        input: String,
        path: PathBuf,
        exit_code: Option<i32>,
        status: String,
    },

    #[error("extractor on '{input}' did not finish within {seconds}s")]
    TimedOut { input: String, seconds: u64 },

    #[error("extractor exited 0 on '{input}' but {dir} does not exist")]
    MissingOutputDir { input: String, dir: PathBuf },

    #[error("failed to summarize report for '{input}': {source}")]
    Report {
        input: String,
        #[source]
        source: ReportError,
    },

    #[error("failed to write report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to collect artifacts for '{input}': {source}")]
    Collect {
        input: String,
        #[source]
        source: CollectError,
    },

    #[error("failed to remove extraction directory {dir}: {source}")]
    Cleanup {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error running bulk extractor, no files returned.")]
    NoOutputFiles,
}

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Lifecycle state of one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Prepare,
    Running,
    Succeeded,
    Failed,
    CleanedUp,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => write!(f, "PREPARE"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::CleanedUp => write!(f, "CLEANED_UP"),
        }
    }
}

fn enter(input: &InputFile, state: RunState) {
    tracing::debug!(input = %input.display_name, state = %state, "extraction state");
}

/// Command line for one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub output_dir: PathBuf,
    pub extra_args: Vec<String>,
    pub input: PathBuf,
}

impl Invocation {
    /// The command without the input path, as reported in the task result.
    pub fn base_command_string(&self) -> String {
        let mut parts = vec![
            self.program.clone(),
            "-o".to_string(),
            self.output_dir.display().to_string(),
        ];
        parts.extend(self.extra_args.iter().cloned());
        parts.join(" ")
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-o")
            .arg(&self.output_dir)
            .args(&self.extra_args)
            .arg(&self.input);
        command
    }
}

/// Everything produced for one successfully processed input.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub report_file: OutputFile,
    pub report: SummaryReport,
    pub artifacts: Vec<OutputFile>,
    pub file_report: FileReport,
    pub command: String,
}

/// Aggregated result over all inputs.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Report files and artifacts, in input order
    pub output_files: Vec<OutputFile>,
    /// Base command of the last input processed
    pub command: String,
    /// Base command of every input, in order
    pub commands: Vec<String>,
    pub file_reports: Vec<FileReport>,
}

/// Runs the extractor over a list of inputs.
pub struct Executor {
    config: TaskConfig,
}

impl Executor {
    pub fn new(config: TaskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Build the command for one input.
    pub fn invocation(&self, output_dir: &Path, input: &InputFile) -> Invocation {
        Invocation {
            program: self.config.extractor.clone(),
            output_dir: output_dir.to_path_buf(),
            extra_args: self.config.extra_args.clone(),
            input: input.path.clone(),
        }
    }

    /// Process every input in order, writing outputs under `output_path`.
    ///
    /// The first failing input aborts the run. A run that produces no output
    /// files at all is an error.
    pub fn run(&self, inputs: &[InputFile], output_path: &Path) -> ExecutorResult<RunOutcome> {
        fs::create_dir_all(output_path)?;
        let mut outcome = RunOutcome::default();

        for input in inputs {
            let extraction = match self.run_input(input, output_path) {
                Ok(extraction) => extraction,
                Err(e) => {
                    remove_output_files(&outcome.output_files);
                    return Err(e);
                }
            };

            outcome.output_files.push(extraction.report_file);
            outcome.output_files.extend(extraction.artifacts);
            outcome.file_reports.push(extraction.file_report);
            outcome.commands.push(extraction.command.clone());
            outcome.command = extraction.command;
        }

        if outcome.output_files.is_empty() {
            return Err(ExecutorError::NoOutputFiles);
        }

        tracing::info!(
            inputs = inputs.len(),
            output_files = outcome.output_files.len(),
            "extraction finished"
        );
        Ok(outcome)
    }

    /// Run the extractor on a single input.
    ///
    /// The extraction directory is removed before this returns, whether the
    /// run succeeded or not.
    pub fn run_input(
        &self,
        input: &InputFile,
        output_path: &Path,
    ) -> ExecutorResult<ExtractionOutcome> {
        enter(input, RunState::Prepare);
        let report_file =
            create_output_file(output_path, &self.config.report_display_name(&input.display_name));
        let run_dir = ExtractionDir::allocate(output_path);
        let invocation = self.invocation(run_dir.path(), input);

        let result = self.extract(input, &invocation, &run_dir, report_file, output_path);

        let dir = run_dir.path().to_path_buf();
        let cleanup = run_dir.cleanup();
        enter(input, RunState::CleanedUp);

        match (result, cleanup) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(outcome), Err(source)) => {
                remove_output_files(std::slice::from_ref(&outcome.report_file));
                remove_output_files(&outcome.artifacts);
                Err(ExecutorError::Cleanup { dir, source })
            }
            (Err(e), Err(cleanup_err)) => {
                tracing::warn!(dir = %dir.display(), error = %cleanup_err, "failed to remove extraction directory");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    fn extract(
        &self,
        input: &InputFile,
        invocation: &Invocation,
        run_dir: &ExtractionDir,
        report_file: OutputFile,
        output_path: &Path,
    ) -> ExecutorResult<ExtractionOutcome> {
        let command = invocation.base_command_string();
        enter(input, RunState::Running);
        tracing::info!(
            input = %input.display_name,
            path = %input.path.display(),
            command = %command,
            "running extractor"
        );

        let status = match self.run_extractor(input, invocation) {
            Ok(status) => status,
            Err(e) => {
                enter(input, RunState::Failed);
                return Err(e);
            }
        };

        if !status.success() {
            enter(input, RunState::Failed);
            let (exit_code, status) = describe_status(&status);
            return Err(ExecutorError::ExtractorFailed {
                input: input.display_name.clone(),
                path: input.path.clone(),
                exit_code,
                status,
            });
        }

        if !run_dir.exists() {
            enter(input, RunState::Failed);
            return Err(ExecutorError::MissingOutputDir {
                input: input.display_name.clone(),
                dir: run_dir.path().to_path_buf(),
            });
        }
        enter(input, RunState::Succeeded);

        let report = generate_summary_report(run_dir.path()).map_err(|source| {
            ExecutorError::Report {
                input: input.display_name.clone(),
                source,
            }
        })?;
        fs::write(&report_file.path, report.to_markdown()).map_err(|source| {
            ExecutorError::WriteReport {
                path: report_file.path.clone(),
                source,
            }
        })?;

        let artifacts = match extract_non_empty_files(run_dir.path(), output_path) {
            Ok(artifacts) => artifacts,
            Err(source) => {
                remove_output_files(std::slice::from_ref(&report_file));
                return Err(ExecutorError::Collect {
                    input: input.display_name.clone(),
                    source,
                });
            }
        };

        tracing::info!(
            input = %input.display_name,
            summary = report.summary(),
            artifacts = artifacts.len(),
            "extraction succeeded"
        );

        let file_report = serialize_file_report(input, &report_file, &report);
        Ok(ExtractionOutcome {
            report_file,
            report,
            artifacts,
            file_report,
            command,
        })
    }

    /// Spawn the extractor, forward its output to the log and wait for it.
    fn run_extractor(
        &self,
        input: &InputFile,
        invocation: &Invocation,
    ) -> ExecutorResult<ExitStatus> {
        let mut child = invocation
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutorError::SpawnFailed {
                input: input.display_name.clone(),
                program: invocation.program.clone(),
                source,
            })?;

        let stdout_handle = child.stdout.take().map(|s| forward_lines(s, "stdout"));
        let stderr_handle = child.stderr.take().map(|s| forward_lines(s, "stderr"));

        let waited = match self.config.timeout_seconds {
            None => child.wait().map(Some),
            Some(seconds) => self.wait_with_timeout(&mut child, Duration::from_secs(seconds)),
        };

        // After a timeout a grandchild may still hold the pipes open; the
        // readers are detached and exit once the last writer goes away.
        if matches!(waited, Ok(Some(_))) {
            for handle in [stdout_handle, stderr_handle].into_iter().flatten() {
                let _ = handle.join();
            }
        }

        match waited? {
            Some(status) => Ok(status),
            None => Err(ExecutorError::TimedOut {
                input: input.display_name.clone(),
                seconds: self.config.timeout_seconds.unwrap_or_default(),
            }),
        }
    }

    /// Wait for exit, terminating the child once `limit` has elapsed.
    ///
    /// Returns `None` when the child had to be terminated.
    fn wait_with_timeout(&self, child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if start.elapsed() >= limit {
                self.terminate_child(child)?;
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Terminate a child process gracefully then forcefully.
    fn terminate_child(&self, child: &mut Child) -> io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            let _ = signal::kill(pid, Signal::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            let _ = child.kill();
        }

        let grace = Duration::from_secs(self.config.termination_grace_seconds);
        let start = Instant::now();
        while start.elapsed() < grace {
            if child.try_wait()?.is_some() {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }

        let _ = child.kill();
        child.wait()?;
        Ok(())
    }
}

/// Forward each line of a child stream to the log on a helper thread.
///
/// The stream is drained until EOF. Lines need not be UTF-8; invalid bytes
/// are logged lossily so the child never sees a closed pipe.
fn forward_lines<R: Read + Send + 'static>(stream: R, name: &'static str) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    tracing::debug!(stream = name, "{}", text.trim_end_matches(['\r', '\n']));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(stream = name, error = %e, "stopped reading extractor output");
                    break;
                }
            }
        }
    })
}

/// Exit code (if any) and a human description of how the process ended.
fn describe_status(status: &ExitStatus) -> (Option<i32>, String) {
    if let Some(code) = status.code() {
        return (Some(code), format!("exit code {}", code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return (None, format!("signal {}", signal));
        }
    }

    (None, "unknown status".to_string())
}
