//! Execution engine - runs compiled solutions against test cases
//!
//! - `ScratchSpace`: the shared input/output files, locked for one run at a time
//! - `Engine`: per-case input preparation, execution and comparison
//!
//! The engine module does NOT:
//! - Compile anything
//! - Parse fixtures or decide which platform applies
//! - Present results

use anyhow::Context;
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use serde::Serialize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ExecutionConfig, ScratchConfig};
use crate::core::{Platform, Verdict};
use crate::error::HarnessError;
use crate::runner::{CommandSpec, LocalRunner, RunOutcome, RunStatus, Runner};
use crate::testcase::TestCase;

pub const TIMEOUT_OUTPUT: &str = "TIMEOUT";

/// Shared scratch directory holding the per-case input and output files
///
/// Holding a `ScratchSpace` means holding an exclusive `flock` on its lock
/// file. Dropping it removes the input and output files and releases the
/// lock. The lock file is never removed, since another run may already
/// have it open and be waiting to lock it.
pub struct ScratchSpace {
    dir: PathBuf,
    input_path: PathBuf,
    output_path: PathBuf,
    lock_path: PathBuf,
    _lock: Flock<File>,
}

impl ScratchSpace {
    pub fn acquire(root: &Path, config: &ScratchConfig) -> Result<Self, HarnessError> {
        let dir = config.dir_in(root);
        std::fs::create_dir_all(&dir)
            .map_err(|e| HarnessError::io(format!("Failed to create {:?}", dir), e))?;

        let lock_path = dir.join(&config.lock_file);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| HarnessError::io(format!("Failed to open {:?}", lock_path), e))?;
        let lock = Flock::lock(file, FlockArg::LockExclusiveNonblock).map_err(|(_, errno)| {
            if errno == Errno::EWOULDBLOCK {
                HarnessError::ScratchBusy(dir.clone())
            } else {
                HarnessError::io(
                    format!("Failed to lock {:?}", lock_path),
                    io::Error::from_raw_os_error(errno as i32),
                )
            }
        })?;

        debug!("Acquired scratch space {:?}", dir);
        Ok(Self {
            input_path: dir.join(&config.input_file),
            output_path: dir.join(&config.output_file),
            lock_path,
            dir,
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl fmt::Debug for ScratchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchSpace")
            .field("dir", &self.dir)
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        for path in [&self.input_path, &self.output_path] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {:?}: {}", path, e),
            }
        }
        debug!("Released scratch space {:?}", self.dir);
    }
}

/// Result of running one case
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub case: TestCase,
    /// Trimmed program output, or `TIMEOUT` / `ERROR: ...`
    pub actual: String,
    pub passed: bool,
    pub verdict: Verdict,
    #[serde(rename = "elapsed_secs", serialize_with = "crate::core::serialize_secs")]
    pub elapsed: Duration,
    pub memory_kb: Option<u64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl ExecutionOutcome {
    fn timed_out(case: &TestCase, bound: Duration, stderr: String) -> Self {
        Self {
            case: case.clone(),
            actual: TIMEOUT_OUTPUT.to_string(),
            passed: false,
            verdict: Verdict::TimeLimitExceeded,
            elapsed: bound,
            memory_kb: None,
            stderr,
        }
    }

    fn fault(case: &TestCase, error: &anyhow::Error) -> Self {
        Self {
            case: case.clone(),
            actual: format!("ERROR: {:#}", error),
            passed: false,
            verdict: Verdict::SystemError,
            elapsed: Duration::ZERO,
            memory_kb: None,
            stderr: String::new(),
        }
    }

    fn completed(case: &TestCase, run: RunOutcome, output: &str) -> Self {
        let actual = output.trim().to_string();
        let passed = outputs_match(&actual, &case.expected);
        let verdict = if passed {
            Verdict::Accepted
        } else if !run.is_success() {
            Verdict::RuntimeError
        } else {
            Verdict::WrongAnswer
        };

        Self {
            case: case.clone(),
            actual,
            passed,
            verdict,
            elapsed: run.elapsed,
            memory_kb: run.memory_kb,
            stderr: run.stderr,
        }
    }
}

/// Exact equality after trimming both sides
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

/// Put each top-level token of a one-line case on its own line.
///
/// Whitespace inside `[...]` or quotes stays part of the token, so
/// `[1, 2, 3] 9` becomes `[1, 2, 3]\n9`.
pub fn reformat_input(input: &str) -> String {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in input.trim().chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens.join("\n")
}

/// Runs cases one at a time through a `Runner`
pub struct Engine {
    runner: Box<dyn Runner>,
    scratch: ScratchSpace,
    timeout: Duration,
}

impl Engine {
    pub fn new(scratch: ScratchSpace, config: &ExecutionConfig) -> Self {
        Self::with_runner(
            Box::new(LocalRunner::new(config.usage_probe())),
            scratch,
            config.timeout(),
        )
    }

    pub fn with_runner(runner: Box<dyn Runner>, scratch: ScratchSpace, timeout: Duration) -> Self {
        Self {
            runner,
            scratch,
            timeout,
        }
    }

    /// Run one case. Every failure is recorded in the outcome.
    pub async fn run_case(
        &mut self,
        executable: &Path,
        case: &TestCase,
        platform: Platform,
    ) -> ExecutionOutcome {
        let input = if platform.reformats_input() {
            reformat_input(&case.input)
        } else {
            case.input.clone()
        };

        let outcome = match self.execute(executable, &input).await {
            Ok((run, _)) if run.status == RunStatus::TimedOut => {
                ExecutionOutcome::timed_out(case, self.timeout, run.stderr)
            }
            Ok((run, output)) => ExecutionOutcome::completed(case, run, &output),
            Err(e) => {
                warn!("Test #{} could not be executed: {:#}", case.number, e);
                ExecutionOutcome::fault(case, &e)
            }
        };

        info!(
            "Test #{}: {} in {:.3}s",
            case.number,
            outcome.verdict,
            outcome.elapsed.as_secs_f64()
        );
        outcome
    }

    async fn execute(&mut self, executable: &Path, input: &str) -> anyhow::Result<(RunOutcome, String)> {
        let input_path = self.scratch.input_path();
        let output_path = self.scratch.output_path();

        tokio::fs::write(input_path, input)
            .await
            .with_context(|| format!("Failed to write {:?}", input_path))?;

        let cmd = CommandSpec::new(executable)
            .with_stdin_file(input_path)
            .with_stdout_file(output_path);
        let run = self.runner.run(&cmd, self.timeout).await?;
        if run.status == RunStatus::TimedOut {
            return Ok((run, String::new()));
        }

        let output = tokio::fs::read(output_path)
            .await
            .with_context(|| format!("Failed to read {:?}", output_path))?;
        Ok((run, String::from_utf8_lossy(&output).into_owned()))
    }
}
