//! Test case parser
//!
//! Extracts sample cases from the fenced ```` ```tests ```` block of a problem's
//! Markdown fixture. Segments are separated by `---` lines and come in one of
//! two layouts:
//!
//! - `Keyed`: `Function:`, `Sample Input:` and `Sample Output:` lines
//! - `Freeform`: input lines, one blank line, expected output lines
//!
//! Malformed segments are dropped silently. Case numbers are the segment's
//! position in the block, so dropped segments leave gaps.

use serde::{Deserialize, Serialize};
use tracing::debug;

const FENCE_OPEN: &str = "```tests";
const FENCE_CLOSE: &str = "```";
const SEPARATOR: &str = "---";

const FUNCTION_PREFIX: &str = "Function:";
const INPUT_PREFIX: &str = "Sample Input:";
const OUTPUT_PREFIX: &str = "Sample Output:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseLayout {
    Keyed,
    Freeform,
}

/// One sample case from a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// 1-based position of the segment inside the tests block
    pub number: usize,
    pub input: String,
    pub expected: String,
    /// Method named by a keyed segment's `Function:` line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl TestCase {
    pub fn new(number: usize, input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            number,
            input: input.into(),
            expected: expected.into(),
            function: None,
        }
    }
}

/// Parse every well-formed case out of a fixture document.
pub fn parse_cases(document: &str, layout: CaseLayout) -> Vec<TestCase> {
    let Some(block) = tests_block(document) else {
        debug!("No ```tests block found in fixture");
        return Vec::new();
    };

    split_segments(&block)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, segment)| {
            let number = idx + 1;
            let case = match layout {
                CaseLayout::Keyed => parse_keyed(number, &segment),
                CaseLayout::Freeform => parse_freeform(number, &segment),
            };
            if case.is_none() {
                debug!("Dropping malformed test segment #{}", number);
            }
            case
        })
        .collect()
}

/// Body of the first complete ```` ```tests ```` block.
fn tests_block(document: &str) -> Option<String> {
    let mut lines = document.lines();
    lines.by_ref().find(|line| line.trim_end() == FENCE_OPEN)?;

    let mut body = Vec::new();
    for line in lines {
        if line.trim_end() == FENCE_CLOSE {
            return Some(body.join("\n"));
        }
        body.push(line);
    }
    None
}

fn split_segments(block: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.trim() == SEPARATOR {
            segments.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    segments.push(current.join("\n"));
    segments
}

fn parse_keyed(number: usize, segment: &str) -> Option<TestCase> {
    let mut function = None;
    let mut input = None;
    let mut expected = None;

    for line in segment.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix(FUNCTION_PREFIX) {
            function.get_or_insert_with(|| rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(INPUT_PREFIX) {
            input.get_or_insert_with(|| rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(OUTPUT_PREFIX) {
            expected.get_or_insert_with(|| rest.trim().to_string());
        }
    }

    let input = input.filter(|s| !s.is_empty())?;
    let expected = expected.filter(|s| !s.is_empty())?;

    Some(TestCase {
        number,
        input,
        expected,
        function: function.filter(|s| !s.is_empty()),
    })
}

fn parse_freeform(number: usize, segment: &str) -> Option<TestCase> {
    let lines: Vec<&str> = segment.trim().lines().collect();
    let blank = lines.iter().position(|line| line.trim().is_empty())?;

    let input = lines[..blank].join("\n");
    let expected = lines[blank + 1..].join("\n").trim().to_string();

    if input.trim().is_empty() || expected.is_empty() {
        return None;
    }

    Some(TestCase::new(number, input, expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(body: &str) -> String {
        format!(
            "# Codeforces - 4A\n\n## Test Cases\n\n```tests\n{}\n```\n\n## Notes\nnone\n",
            body
        )
    }

    #[test]
    fn test_freeform_two_cases() {
        let doc = fixture("3 4\n\n7\n---\n5 5\n\n10\n");
        let cases = parse_cases(&doc, CaseLayout::Freeform);

        assert_eq!(
            cases,
            vec![TestCase::new(1, "3 4", "7"), TestCase::new(2, "5 5", "10")]
        );
    }

    #[test]
    fn test_freeform_multiline_input_and_output() {
        let doc = fixture("3\n1 2 3\n\n6\nYES\n");
        let cases = parse_cases(&doc, CaseLayout::Freeform);

        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].input, "3\n1 2 3");
        assert_eq!(cases[0].expected, "6\nYES");
    }

    #[test]
    fn test_freeform_drops_segment_without_blank_line() {
        let doc = fixture("1 1\n2\n---\n2 2\n\n4\n");
        let cases = parse_cases(&doc, CaseLayout::Freeform);

        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].number, 2, "numbering keeps the original position");
        assert_eq!(cases[0].expected, "4");
    }

    #[test]
    fn test_freeform_drops_empty_expected() {
        let doc = fixture("1 1\n\n\n---\n2 2\n\n4");
        let cases = parse_cases(&doc, CaseLayout::Freeform);

        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].number, 2);
    }

    #[test]
    fn test_keyed_cases() {
        let doc = fixture(
            "Function: twoSum\nSample Input: [2,7,11,15] 9\nSample Output: [0,1]\n---\n\
             Function: twoSum\nSample Input: [3,2,4] 6\nSample Output: [1,2]",
        );
        let cases = parse_cases(&doc, CaseLayout::Keyed);

        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].input, "[2,7,11,15] 9");
        assert_eq!(cases[0].expected, "[0,1]");
        assert_eq!(cases[0].function.as_deref(), Some("twoSum"));
        assert_eq!(cases[1].number, 2);
        assert_eq!(cases[1].expected, "[1,2]");
    }

    #[test]
    fn test_keyed_drops_missing_output() {
        let doc = fixture(
            "Function: f\nSample Input: 1\n---\nFunction: f\nSample Input: 2\nSample Output: 4\n---\n\
             Function: f\nSample Input:\nSample Output: 9",
        );
        let cases = parse_cases(&doc, CaseLayout::Keyed);

        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].number, 2);
        assert_eq!(cases[0].input, "2");
    }

    #[test]
    fn test_keyed_without_function_line() {
        let doc = fixture("Sample Input: 5 3\nSample Output: 8");
        let cases = parse_cases(&doc, CaseLayout::Keyed);

        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].function, None);
    }

    #[test]
    fn test_n_well_formed_segments() {
        let body = (1..=7)
            .map(|i| format!("{}\n\n{}", i, i * i))
            .collect::<Vec<_>>()
            .join("\n---\n");
        let cases = parse_cases(&fixture(&body), CaseLayout::Freeform);

        assert_eq!(cases.len(), 7);
        for (idx, case) in cases.iter().enumerate() {
            assert_eq!(case.number, idx + 1);
            assert_eq!(case.expected, ((idx + 1) * (idx + 1)).to_string());
        }
    }

    #[test]
    fn test_missing_block_is_empty() {
        assert!(parse_cases("# nothing here\n", CaseLayout::Freeform).is_empty());
        assert!(parse_cases("```text\n1\n\n2\n```\n", CaseLayout::Freeform).is_empty());
    }

    #[test]
    fn test_unterminated_block_is_empty() {
        assert!(parse_cases("```tests\n1\n\n2\n", CaseLayout::Freeform).is_empty());
    }
}
