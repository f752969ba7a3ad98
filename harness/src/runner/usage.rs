//! Usage probe report parser
//!
//! The probe (`time -f "%e %M"`) appends its report to the program's stderr:
//! optional status lines, then `<elapsed secs> <peak rss KB>` as the last line.
//! Elapsed time is measured by the runner itself, and the exit code comes from
//! the child's own status, so only peak memory and a terminating signal are
//! kept from the report.

const EXITED_PREFIX: &str = "Command exited with non-zero status ";
const SIGNALED_PREFIX: &str = "Command terminated by signal ";

/// Parsed probe report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageReport {
    /// Peak resident set size in KB
    pub memory_kb: Option<u64>,
    /// Signal that terminated the program
    pub signal: Option<i32>,
}

/// Separate the program's own stderr from the probe report.
///
/// When the last line is not a usage line the stderr is returned untouched
/// and the report is empty.
pub fn split_usage(stderr: &str) -> (String, UsageReport) {
    let mut lines: Vec<&str> = stderr.trim_end().lines().collect();
    let mut report = UsageReport::default();

    let Some(memory) = lines.last().and_then(|line| parse_usage_line(line)) else {
        return (stderr.to_string(), report);
    };
    lines.pop();
    report.memory_kb = Some(memory);

    while let Some(line) = lines.last() {
        if let Some(sig) = line.strip_prefix(SIGNALED_PREFIX) {
            report.signal = sig.trim().parse().ok();
        } else if !line.starts_with(EXITED_PREFIX) {
            break;
        }
        lines.pop();
    }

    (lines.join("\n"), report)
}

/// Peak memory from a `<elapsed> <memory>` line
fn parse_usage_line(line: &str) -> Option<u64> {
    let mut parts = line.split_whitespace();
    parts.next()?.parse::<f64>().ok()?;
    let memory = parts.next()?.parse::<u64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(memory)
}
