//! Harness module for running one source file against its fixture
//!
//! Resolves the source and fixture, parses cases, synthesizes a driver when
//! the platform needs one, compiles, and runs every case in order. Every
//! temporary artifact is owned by a guard, so cleanup happens on success,
//! failure and cancellation alike.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::compiler::{executable_path_for, CompilationOutcome, Compiler};
use crate::config::HarnessConfig;
use crate::core::Platform;
use crate::driver::{render, DriverFile, DriverPlan};
use crate::engine::{Engine, ExecutionOutcome, ScratchSpace};
use crate::error::HarnessError;
use crate::signature::{extract_signature, CallableSignature};
use crate::testcase::{parse_cases, TestCase};

const FIXTURE_DIR: &str = "tests";
const FIXTURE_EXTENSION: &str = "md";

/// What to run
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub source: PathBuf,
    /// Fixture override, `<source dir>/tests/<stem>.md` otherwise
    pub tests: Option<PathBuf>,
    /// Platform override, detected from the source otherwise
    pub platform: Option<Platform>,
    /// Run root override, the parent of the source's directory otherwise
    pub root: Option<PathBuf>,
    /// Appended after the baseline compiler flags
    pub extra_flags: Vec<String>,
}

impl RunRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_tests(mut self, tests: impl Into<PathBuf>) -> Self {
        self.tests = Some(tests.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_extra_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    fn fixture_path(&self, source: &Path) -> PathBuf {
        if let Some(tests) = &self.tests {
            return tests.clone();
        }
        let stem = source.file_stem().unwrap_or_default().to_string_lossy();
        source_dir(source)
            .join(FIXTURE_DIR)
            .join(format!("{}.{}", stem, FIXTURE_EXTENSION))
    }

    fn run_root(&self, source: &Path) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }
        let dir = source_dir(source);
        dir.parent().unwrap_or(dir).to_path_buf()
    }
}

fn source_dir(source: &Path) -> &Path {
    source.parent().unwrap_or(Path::new("."))
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub fixture: PathBuf,
    pub platform: Platform,
    /// Present when a driver was synthesized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<CallableSignature>,
    pub compilation: CompilationOutcome,
    #[serde(rename = "compile_time_secs", serialize_with = "crate::core::serialize_secs")]
    pub compile_time: Duration,
    /// Empty when compilation failed
    pub outcomes: Vec<ExecutionOutcome>,
}

fn warn_on_function_mismatch(signature: &CallableSignature, cases: &[TestCase]) {
    let mismatch = cases
        .iter()
        .filter_map(|case| case.function.as_deref())
        .find(|function| *function != signature.name);
    if let Some(function) = mismatch {
        warn!(
            "Fixture names function `{}` but the source declares `{}`",
            function, signature.name
        );
    }
}

/// Run a source file against its fixture.
pub async fn run(request: &RunRequest, config: &HarnessConfig) -> Result<RunReport, HarnessError> {
    if !request.source.is_file() {
        return Err(HarnessError::SourceNotFound(request.source.clone()));
    }
    let source_path = std::fs::canonicalize(&request.source)
        .map_err(|e| HarnessError::io(format!("Failed to resolve {:?}", request.source), e))?;
    let source = tokio::fs::read_to_string(&source_path)
        .await
        .map_err(|e| HarnessError::io(format!("Failed to read {:?}", source_path), e))?;

    let platform = request
        .platform
        .unwrap_or_else(|| Platform::detect(&source));
    info!("Platform: {}", platform);

    let fixture = request.fixture_path(&source_path);
    if !fixture.is_file() {
        return Err(HarnessError::FixtureNotFound(fixture));
    }
    let document = tokio::fs::read_to_string(&fixture)
        .await
        .map_err(|e| HarnessError::io(format!("Failed to read {:?}", fixture), e))?;
    let cases = parse_cases(&document, platform.case_layout());
    if cases.is_empty() {
        return Err(HarnessError::NoTestCases(fixture));
    }
    info!("Found {} test cases in {:?}", cases.len(), fixture);

    let root = request.run_root(&source_path);
    let scratch = ScratchSpace::acquire(&root, &config.scratch)?;

    let mut signature = None;
    let mut driver = None;
    let compile_source = if platform.needs_driver() {
        let extracted = extract_signature(&source);
        warn_on_function_mismatch(&extracted, &cases);
        info!("Signature: {}", extracted);

        let plan = DriverPlan::build(&extracted, &cases[0].input);
        let file = DriverFile::create(config.scratch.driver_path(&root), &render(&plan, &source))
            .map_err(|e| HarnessError::io("Failed to write driver", e))?;
        let path = file.path().to_path_buf();
        driver = Some(file);
        signature = Some(extracted);
        path
    } else {
        source_path.clone()
    };

    let executable = executable_path_for(&source_path);
    let compiler = Compiler::new(&config.compiler);
    let started = Instant::now();
    let compilation = compiler
        .compile(&compile_source, &executable, &request.extra_flags)
        .await;
    let compile_time = started.elapsed();
    drop(driver);

    let outcomes = match compilation.executable() {
        Some(executable) => {
            info!("Compilation successful ({:.2}s)", compile_time.as_secs_f64());
            let mut engine = Engine::new(scratch, &config.execution);
            let mut outcomes = Vec::with_capacity(cases.len());
            for case in &cases {
                outcomes.push(engine.run_case(executable, case, platform).await);
            }
            outcomes
        }
        None => {
            warn!("Compilation failed; no test case was executed");
            Vec::new()
        }
    };
    debug!("Run finished with {} outcomes", outcomes.len());

    Ok(RunReport {
        source: source_path,
        fixture,
        platform,
        signature,
        compilation,
        compile_time,
        outcomes,
    })
}
