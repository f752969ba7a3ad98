//! Helpers shared by tests that need host tools

use std::process::{Command, Stdio};
use std::sync::OnceLock;

fn tool_runs(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// `g++` is on PATH; tests that compile skip themselves otherwise
pub fn has_gxx() -> bool {
    static GXX: OnceLock<bool> = OnceLock::new();
    *GXX.get_or_init(|| tool_runs("g++", &["--version"]))
}

pub fn has_sh() -> bool {
    static SH: OnceLock<bool> = OnceLock::new();
    *SH.get_or_init(|| tool_runs("/bin/sh", &["-c", "exit 0"]))
}

/// Wait up to one second for `pid` to disappear (zombies count as gone)
pub async fn process_exits(pid: &str) -> bool {
    let stat_path = format!("/proc/{}/stat", pid);
    for _ in 0..20 {
        let alive = std::fs::read_to_string(&stat_path)
            .map(|stat| !stat.contains(") Z"))
            .unwrap_or(false);
        if !alive {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    false
}
