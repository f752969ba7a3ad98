//! Harness configuration
//!
//! Defaults live in `files/harness.toml`, embedded at build time. A file given
//! with `--config` or `HARNESS_CONFIG` replaces them; keys it leaves out keep
//! their defaults.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/harness.toml"));

pub const CONFIG_ENV: &str = "HARNESS_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub compiler: CompilerConfig,
    pub execution: ExecutionConfig,
    pub scratch: ScratchConfig,
}

/// Toolchain invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub program: String,
    /// Baseline flags, placed before any per-run extra flags
    pub flags: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "g++".to_string(),
            flags: ["-std=c++17", "-O2", "-Wall", "-Wextra"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_secs: 30,
        }
    }
}

impl CompilerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Wall-clock bound per case
    pub timeout_secs: u64,
    /// `time`-compatible utility used for peak memory; empty disables it
    pub usage_probe: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            usage_probe: "/usr/bin/time".to_string(),
        }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn usage_probe(&self) -> Option<&Path> {
        (!self.usage_probe.trim().is_empty()).then(|| Path::new(&self.usage_probe))
    }
}

/// Shared scratch files, relative to the run root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    pub dir: PathBuf,
    pub input_file: String,
    pub output_file: String,
    pub driver_file: String,
    pub lock_file: String,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("io"),
            input_file: "input.txt".to_string(),
            output_file: "output.txt".to_string(),
            driver_file: "temp_driver.cpp".to_string(),
            lock_file: ".harness.lock".to_string(),
        }
    }
}

impl ScratchConfig {
    pub fn dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.dir)
    }

    pub fn driver_path(&self, root: &Path) -> PathBuf {
        self.dir_in(root).join(&self.driver_file)
    }
}

impl HarnessConfig {
    /// Embedded defaults
    pub fn embedded() -> anyhow::Result<Self> {
        toml::from_str(DEFAULT_CONFIG).context("Embedded harness.toml is invalid")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Resolve configuration: explicit path, then `HARNESS_CONFIG`, then the
    /// embedded defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!("Loaded configuration from {:?}", path);
                Ok(config)
            }
            None => Self::embedded(),
        }
    }
}

/// Global harness configuration
static HARNESS_CONFIG: OnceLock<HarnessConfig> = OnceLock::new();

pub fn init_config(config: HarnessConfig) -> anyhow::Result<()> {
    HARNESS_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Harness configuration already initialized"))
}

pub fn get_config() -> &'static HarnessConfig {
    HARNESS_CONFIG.get().unwrap_or_else(|| {
        static DEFAULT: OnceLock<HarnessConfig> = OnceLock::new();

        warn!("Harness configuration not initialized, using default");
        DEFAULT.get_or_init(HarnessConfig::default)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_embedded_matches_default() {
        assert_eq!(HarnessConfig::embedded().unwrap(), HarnessConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[compiler]
program = "clang++"

[execution]
timeout_secs = 2
usage_probe = ""
"#
        )
        .unwrap();

        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.compiler.program, "clang++");
        assert_eq!(config.compiler.flags, CompilerConfig::default().flags);
        assert_eq!(config.execution.timeout(), Duration::from_secs(2));
        assert_eq!(config.execution.usage_probe(), None);
        assert_eq!(config.scratch, ScratchConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[compiler]\ntimeout_secs = \"soon\"").unwrap();
        assert!(HarnessConfig::from_file(file.path()).is_err());
        assert!(HarnessConfig::from_file(Path::new("/nonexistent/harness.toml")).is_err());
    }

    #[test]
    fn test_scratch_paths() {
        let scratch = ScratchConfig::default();
        let root = Path::new("/work");
        assert_eq!(scratch.dir_in(root), PathBuf::from("/work/io"));
        assert_eq!(scratch.driver_path(root), PathBuf::from("/work/io/temp_driver.cpp"));
    }

    #[test]
    fn test_get_config_without_init_uses_default() {
        assert_eq!(get_config().execution.timeout_secs, 5);
    }
}
