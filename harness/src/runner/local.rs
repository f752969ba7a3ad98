//! Local runner implementation
//!
//! Executes a compiled program directly with file-backed stdin/stdout. The
//! child leads its own process group so a timeout (or a dropped run) takes
//! down anything it spawned. Peak memory comes from the usage probe when one
//! is available.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::group::{group_leader, ProcessGroupGuard};
use super::usage::{split_usage, UsageReport};
use super::{CommandSpec, RunOutcome, RunStatus, Runner};

const USAGE_FORMAT: &str = "%e %M";

/// Runner that executes programs on the host
pub struct LocalRunner {
    usage_probe: Option<PathBuf>,
    /// Cached probe availability
    probe_available: OnceLock<bool>,
}

impl LocalRunner {
    pub fn new(usage_probe: Option<&Path>) -> Self {
        Self {
            usage_probe: usage_probe.map(Path::to_path_buf),
            probe_available: OnceLock::new(),
        }
    }

    /// Probe path if it runs, checked on first use
    async fn probe_ready(&self) -> Option<&Path> {
        let probe = self.usage_probe.as_deref()?;
        if let Some(ready) = self.probe_available.get() {
            return ready.then_some(probe);
        }

        let ready = Command::new(probe)
            .args(["-f", USAGE_FORMAT, "true"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false);

        if ready {
            debug!("Usage probe {:?} available", probe);
        } else {
            warn!(
                "Usage probe {:?} is not available; memory will not be reported",
                probe
            );
        }
        let _ = self.probe_available.set(ready);
        ready.then_some(probe)
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new(None)
    }
}

fn open_stdio(path: Option<&Path>, write: bool) -> Result<Stdio> {
    let Some(path) = path else {
        return Ok(Stdio::null());
    };
    let file = if write {
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?
    } else {
        File::open(path).with_context(|| format!("Failed to open {:?}", path))?
    };
    Ok(Stdio::from(file))
}

fn exit_status(exit: &ExitStatus, report: &UsageReport) -> RunStatus {
    if let Some(signal) = report.signal {
        return RunStatus::Signaled(signal);
    }
    match (exit.code(), exit.signal()) {
        (Some(code), _) => RunStatus::Exited(code),
        (None, Some(signal)) => RunStatus::Signaled(signal),
        (None, None) => RunStatus::Exited(-1),
    }
}

#[async_trait]
impl Runner for LocalRunner {
    async fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<RunOutcome> {
        let probe = self.probe_ready().await;

        let mut std_command = match probe {
            Some(probe) => {
                let mut command = std::process::Command::new(probe);
                command.args(["-f", USAGE_FORMAT]).arg(&cmd.program);
                command
            }
            None => std::process::Command::new(&cmd.program),
        };
        std_command
            .args(&cmd.args)
            .stdin(open_stdio(cmd.stdin_path.as_deref(), false)?)
            .stdout(open_stdio(cmd.stdout_path.as_deref(), true)?)
            .stderr(Stdio::piped());
        let mut command = group_leader(std_command);

        debug!("Running {:?} with args {:?}", cmd.program, cmd.args);

        let start = Instant::now();
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {:?}", cmd.program))?;
        let mut group = ProcessGroupGuard::new(child.id());

        let stderr_task = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                buf
            })
        });

        let waited = tokio::time::timeout(timeout, child.wait()).await;
        let elapsed = start.elapsed();

        // Leftover descendants would keep the stderr pipe open
        group.kill();
        let exit = match waited {
            Ok(result) => Some(result.context("Failed to wait for program")?),
            Err(_) => {
                let _ = child.wait().await;
                None
            }
        };

        let raw_stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let raw_stderr = String::from_utf8_lossy(&raw_stderr).into_owned();
        let (stderr, report) = match probe {
            Some(_) => split_usage(&raw_stderr),
            None => (raw_stderr, UsageReport::default()),
        };

        let status = match &exit {
            Some(exit) => exit_status(exit, &report),
            None => RunStatus::TimedOut,
        };
        let memory_kb = match status {
            RunStatus::TimedOut => None,
            _ => report.memory_kb,
        };

        debug!(
            "Finished {:?}: {:?} in {:?} ({:?} KB)",
            cmd.program, status, elapsed, memory_kb
        );

        Ok(RunOutcome {
            status,
            elapsed,
            memory_kb,
            stderr,
        })
    }
}
