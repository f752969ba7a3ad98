//! Runner module - Process execution abstraction
//!
//! - `LocalRunner`: runs a compiled program directly, in its own process group
//! - `group`: process-group spawning and kill guard, shared with the compiler
//! - `usage`: parser for the usage probe's report
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Own the scratch files it is pointed at
//! - Know about platforms or test cases

pub mod group;
pub mod local;
pub mod usage;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// File connected to stdin, `/dev/null` when absent
    pub stdin_path: Option<PathBuf>,
    /// File receiving stdout, discarded when absent
    pub stdout_path: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            stdin_path: None,
            stdout_path: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_stdin_file(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_stdout_file(mut self, path: impl AsRef<Path>) -> Self {
        self.stdout_path = Some(path.as_ref().to_path_buf());
        self
    }
}

/// Execution status (raw, no verdict interpretation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by signal
    Signaled(i32),
    /// Wall-clock bound exceeded, process group killed
    TimedOut,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Wall time measured around the process
    pub elapsed: Duration,
    /// Peak memory, when the usage probe reported it
    pub memory_kb: Option<u64>,
    /// The program's own stderr, probe report removed
    pub stderr: String,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command under a wall-clock bound.
    ///
    /// `Err` means the program could not be run at all (spawn or I/O fault).
    async fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<RunOutcome>;
}

pub use group::{group_leader, ProcessGroupGuard};
pub use local::LocalRunner;
