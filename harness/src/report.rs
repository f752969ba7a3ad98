//! Result reporting
//!
//! `RunSummary` aggregates a run; a `Presenter` turns report and summary into
//! text. The presenter is picked once, when the `Reporter` is built.

use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use crate::engine::ExecutionOutcome;
use crate::harness::RunReport;

/// Aggregate numbers for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub total: usize,
    #[serde(rename = "average_elapsed_secs", serialize_with = "crate::core::serialize_secs")]
    pub average_elapsed: Duration,
    #[serde(rename = "max_elapsed_secs", serialize_with = "crate::core::serialize_secs")]
    pub max_elapsed: Duration,
    pub peak_memory_kb: Option<u64>,
    #[serde(rename = "compile_time_secs", serialize_with = "crate::core::serialize_secs")]
    pub compile_time: Duration,
    pub all_passed: bool,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[ExecutionOutcome], compile_time: Duration) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let elapsed_sum: Duration = outcomes.iter().map(|o| o.elapsed).sum();
        let average_elapsed = u32::try_from(total)
            .ok()
            .filter(|&n| n > 0)
            .map(|n| elapsed_sum / n)
            .unwrap_or_default();

        Self {
            passed,
            total,
            average_elapsed,
            max_elapsed: outcomes.iter().map(|o| o.elapsed).max().unwrap_or_default(),
            peak_memory_kb: outcomes.iter().filter_map(|o| o.memory_kb).max(),
            compile_time,
            all_passed: total > 0 && passed == total,
        }
    }
}

/// Output strategy
pub trait Presenter: Send + Sync {
    fn present(&self, report: &RunReport, summary: &RunSummary) -> anyhow::Result<String>;
}

/// Human-readable text without colors
pub struct PlainPresenter;

fn memory_text(memory_kb: Option<u64>) -> String {
    memory_kb
        .map(|kb| format!("{} KB", kb))
        .unwrap_or_else(|| "N/A".to_string())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Presenter for PlainPresenter {
    fn present(&self, report: &RunReport, summary: &RunSummary) -> anyhow::Result<String> {
        let mut out = String::new();
        writeln!(out, "Source:   {}", report.source.display())?;
        writeln!(out, "Platform: {}", report.platform)?;
        if let Some(signature) = &report.signature {
            writeln!(out, "Method:   {}", signature)?;
        }

        if let Some(diagnostic) = report.compilation.diagnostic() {
            writeln!(out, "\nCompilation failed:")?;
            writeln!(out, "{}", diagnostic)?;
            return Ok(out);
        }
        writeln!(
            out,
            "Compiled in {:.2}s\n",
            summary.compile_time.as_secs_f64()
        )?;

        for outcome in &report.outcomes {
            let status = if outcome.passed { "PASSED" } else { "FAILED" };
            writeln!(
                out,
                "Test #{}: {} [{}] {:.3}s, {}",
                outcome.case.number,
                status,
                outcome.verdict,
                outcome.elapsed.as_secs_f64(),
                memory_text(outcome.memory_kb)
            )?;
        }

        writeln!(out, "\nTest Results: {}/{} passed", summary.passed, summary.total)?;
        writeln!(
            out,
            "Time: avg {:.3}s, max {:.3}s | Peak memory: {}",
            summary.average_elapsed.as_secs_f64(),
            summary.max_elapsed.as_secs_f64(),
            memory_text(summary.peak_memory_kb)
        )?;

        let failures: Vec<_> = report.outcomes.iter().filter(|o| !o.passed).collect();
        if !failures.is_empty() {
            writeln!(out, "\nFailures:")?;
            for outcome in failures {
                writeln!(out, "Test #{}:", outcome.case.number)?;
                writeln!(out, "  Input:\n{}", indent(&outcome.case.input))?;
                writeln!(out, "  Expected:\n{}", indent(&outcome.case.expected))?;
                writeln!(out, "  Actual:\n{}", indent(&outcome.actual))?;
                if !outcome.stderr.trim().is_empty() {
                    writeln!(out, "  Stderr:\n{}", indent(outcome.stderr.trim_end()))?;
                }
            }
        }

        Ok(out)
    }
}

/// One pretty-printed JSON document
pub struct JsonPresenter;

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    report: &'a RunReport,
    summary: &'a RunSummary,
}

impl Presenter for JsonPresenter {
    fn present(&self, report: &RunReport, summary: &RunSummary) -> anyhow::Result<String> {
        let mut json = serde_json::to_string_pretty(&JsonDocument { report, summary })?;
        json.push('\n');
        Ok(json)
    }
}

pub struct Reporter {
    presenter: Box<dyn Presenter>,
}

impl Reporter {
    pub fn new(presenter: Box<dyn Presenter>) -> Self {
        Self { presenter }
    }

    pub fn render(&self, report: &RunReport) -> anyhow::Result<(String, RunSummary)> {
        let summary = RunSummary::from_outcomes(&report.outcomes, report.compile_time);
        let text = self.presenter.present(report, &summary)?;
        Ok((text, summary))
    }

    /// Render to `out` and return the summary
    pub fn write_to(&self, report: &RunReport, out: &mut impl Write) -> anyhow::Result<RunSummary> {
        let (text, summary) = self.render(report)?;
        out.write_all(text.as_bytes())?;
        out.flush().or_else(|e| match e.kind() {
            io::ErrorKind::BrokenPipe => Ok(()),
            _ => Err(e),
        })?;
        Ok(summary)
    }
}
