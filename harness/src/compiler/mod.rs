//! Compiler module - C++ toolchain adapter
//!
//! Runs the configured compiler with baseline flags plus per-run extras and
//! turns every result (success, diagnostics, timeout, spawn failure) into a
//! `CompilationOutcome`. Compilation never returns an error. The compiler
//! leads its own process group, so a timeout or an interrupted run leaves no
//! `cc1plus`/`as`/`ld` behind.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::runner::{group_leader, ProcessGroupGuard};

/// Result of a compilation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompilationOutcome {
    Compiled { executable: PathBuf },
    Failed { diagnostic: String },
}

impl CompilationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompilationOutcome::Compiled { .. })
    }

    pub fn executable(&self) -> Option<&Path> {
        match self {
            CompilationOutcome::Compiled { executable } => Some(executable),
            CompilationOutcome::Failed { .. } => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            CompilationOutcome::Compiled { .. } => None,
            CompilationOutcome::Failed { diagnostic } => Some(diagnostic),
        }
    }

    fn failed(diagnostic: impl Into<String>) -> Self {
        CompilationOutcome::Failed {
            diagnostic: diagnostic.into(),
        }
    }
}

/// `<source dir>/out/<stem>`
pub fn executable_path_for(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "a".to_string());
    let dir = source.parent().unwrap_or(Path::new("."));
    let path = dir.join("out").join(stem);
    if cfg!(windows) {
        path.with_extension("exe")
    } else {
        path
    }
}

#[derive(Debug, Clone)]
pub struct Compiler {
    program: String,
    flags: Vec<String>,
    timeout: Duration,
}

impl Compiler {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            program: config.program.clone(),
            flags: config.flags.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_args(&self, source: &Path, executable: &Path, extra_flags: &[String]) -> Vec<String> {
        let mut args = self.flags.clone();
        args.extend(extra_flags.iter().cloned());
        args.push(source.to_string_lossy().into_owned());
        args.push("-o".to_string());
        args.push(executable.to_string_lossy().into_owned());
        args
    }

    /// Compile `source` into `executable`.
    pub async fn compile(
        &self,
        source: &Path,
        executable: &Path,
        extra_flags: &[String],
    ) -> CompilationOutcome {
        if let Some(out_dir) = executable.parent() {
            if let Err(e) = tokio::fs::create_dir_all(out_dir).await {
                return CompilationOutcome::failed(format!(
                    "Failed to create output directory {:?}: {}",
                    out_dir, e
                ));
            }
        }

        let args = self.command_args(source, executable, extra_flags);
        debug!("Compiling with {} {:?}", self.program, args);

        let mut command = std::process::Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let child = match group_leader(command).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start compiler {}: {}", self.program, e);
                return CompilationOutcome::failed(format!(
                    "Failed to run compiler {}: {}",
                    self.program, e
                ));
            }
        };
        // cc1plus, as and ld share the group; dropping the guard (timeout or
        // cancelled run) kills all of them
        let mut group = ProcessGroupGuard::new(child.id());

        let waited = tokio::time::timeout(self.timeout, child.wait_with_output()).await;
        group.kill();
        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return CompilationOutcome::failed(format!("Failed to wait for compiler: {}", e))
            }
            Err(_) => {
                warn!("Compilation exceeded {:?}", self.timeout);
                return CompilationOutcome::failed("Compilation timeout");
            }
        };

        if output.status.success() {
            info!("Compiled {:?} -> {:?}", source, executable);
            return CompilationOutcome::Compiled {
                executable: executable.to_path_buf(),
            };
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let diagnostic = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            match output.status.code() {
                Some(code) => format!("Compilation failed with exit code {}", code),
                None => "Compiler was terminated by a signal".to_string(),
            }
        };
        CompilationOutcome::failed(diagnostic)
    }
}
