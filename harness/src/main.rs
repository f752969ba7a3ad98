mod compiler;
mod config;
mod core;
mod driver;
mod engine;
mod error;
mod harness;
mod report;
mod runner;
mod signature;
mod testcase;

#[cfg(test)]
mod test_utils;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::HarnessConfig;
use crate::core::Platform;
use crate::error::HarnessError;
use crate::harness::{RunReport, RunRequest};
use crate::report::{JsonPresenter, PlainPresenter, Presenter, Reporter};

const DEFAULT_LOG_FILTER: &str = "cp_harness=info";

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Plain,
    Json,
}

impl Format {
    fn presenter(self) -> Box<dyn Presenter> {
        match self {
            Format::Plain => Box::new(PlainPresenter),
            Format::Json => Box::new(JsonPresenter),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cp-harness", version)]
#[command(about = "Compile a C++ solution and run it against its Markdown test fixture", long_about = None)]
struct Cli {
    /// C++ source file to test
    source: PathBuf,

    /// Extra compiler flags, appended after the baseline flags
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    extra_flags: Vec<String>,

    /// Fixture file (default: <source dir>/tests/<stem>.md)
    #[arg(long)]
    tests: Option<PathBuf>,

    /// Platform override (codeforces, leetcode, atcoder, hackerrank)
    #[arg(long)]
    platform: Option<Platform>,

    /// Directory holding the shared io/ scratch files (default: parent of the source's directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Configuration file (default: $HARNESS_CONFIG, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = Format::Plain)]
    format: Format,
}

impl Cli {
    fn request(&self) -> RunRequest {
        let mut request =
            RunRequest::new(&self.source).with_extra_flags(self.extra_flags.iter().cloned());
        if let Some(tests) = &self.tests {
            request = request.with_tests(tests);
        }
        if let Some(platform) = self.platform {
            request = request.with_platform(platform);
        }
        if let Some(root) = &self.root {
            request = request.with_root(root);
        }
        request
    }
}

enum RunEnd {
    Finished(Result<RunReport, HarnessError>),
    Interrupted,
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match try_main(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn try_main(cli: Cli) -> Result<ExitCode> {
    config::init_config(HarnessConfig::load(cli.config.as_deref())?)?;
    let config = config::get_config();
    let request = cli.request();
    let reporter = Reporter::new(cli.format.presenter());

    info!("Testing {:?}", request.source);

    // Dropping the run future kills the running program and removes the
    // driver and scratch files
    let end = tokio::select! {
        result = harness::run(&request, config) => RunEnd::Finished(result),
        _ = interrupted() => RunEnd::Interrupted,
    };

    match end {
        RunEnd::Interrupted => {
            warn!("Interrupted");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        RunEnd::Finished(Err(HarnessError::NoTestCases(fixture))) => {
            warn!("No test cases found in {:?}", fixture);
            Ok(ExitCode::from(EXIT_FAILURE))
        }
        RunEnd::Finished(Err(e)) => {
            error!("{}", e);
            Ok(ExitCode::from(EXIT_FAILURE))
        }
        RunEnd::Finished(Ok(report)) => {
            let summary = reporter.write_to(&report, &mut std::io::stdout().lock())?;
            if summary.all_passed {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_FAILURE))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags_and_options() {
        let cli = Cli::try_parse_from([
            "cp-harness",
            "--platform",
            "leetcode",
            "--format",
            "json",
            "02_leetcode/1-two_sum.cpp",
            "-DLOCAL",
            "-fsanitize=address",
        ])
        .unwrap();

        assert_eq!(cli.platform, Some(Platform::LeetCode));
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.extra_flags, vec!["-DLOCAL", "-fsanitize=address"]);

        let request = cli.request();
        assert_eq!(request.source, PathBuf::from("02_leetcode/1-two_sum.cpp"));
        assert_eq!(request.platform, Some(Platform::LeetCode));
        assert_eq!(request.tests, None);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["cp-harness", "a.cpp"]).unwrap();
        assert_eq!(cli.format, Format::Plain);
        assert!(cli.extra_flags.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_platform() {
        assert!(Cli::try_parse_from(["cp-harness", "--platform", "topcoder", "a.cpp"]).is_err());
    }
}
