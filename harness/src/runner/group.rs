//! Process-group ownership for spawned tools
//!
//! Programs and compilers are spawned as leaders of a fresh process group so
//! that everything they fork can be killed together.

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use tokio::process::Command;
use tracing::warn;

/// Async command whose child leads its own process group
pub fn group_leader(mut command: std::process::Command) -> Command {
    command.process_group(0);
    let mut command = Command::from(command);
    command.kill_on_drop(true);
    command
}

/// Kills a child's process group when dropped
pub struct ProcessGroupGuard {
    pgid: Option<Pid>,
}

impl ProcessGroupGuard {
    /// `pid` is the group leader's pid, as returned by `Child::id`
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|pid| i32::try_from(pid).ok()).map(Pid::from_raw),
        }
    }

    pub fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            match killpg(pgid, Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => warn!("Failed to kill process group {}: {}", pgid, e),
            }
        }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}
