//! Judge platform tag and the per-platform harness policy
//!
//! The platform decides three things for a run:
//! - which fixture layout the test file uses
//! - whether the source is a bare `Solution` class that needs a synthesized driver
//! - whether case input is reformatted into one top-level token per line

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::testcase::CaseLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Codeforces,
    LeetCode,
    AtCoder,
    HackerRank,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Codeforces,
        Platform::LeetCode,
        Platform::AtCoder,
        Platform::HackerRank,
    ];

    /// Detect the platform from the first line of the source file.
    ///
    /// Problem files start with a comment such as `// LeetCode: <link>`.
    /// Unrecognized headers fall back to Codeforces.
    pub fn detect(source: &str) -> Self {
        let first_line = source.lines().next().unwrap_or("").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|platform| first_line.contains(&platform.key()))
            .unwrap_or_default()
    }

    fn key(&self) -> String {
        self.display_name().to_lowercase()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Codeforces => "Codeforces",
            Platform::LeetCode => "LeetCode",
            Platform::AtCoder => "AtCoder",
            Platform::HackerRank => "HackerRank",
        }
    }

    pub fn case_layout(&self) -> CaseLayout {
        match self {
            Platform::LeetCode => CaseLayout::Keyed,
            _ => CaseLayout::Freeform,
        }
    }

    /// LeetCode sources only define `class Solution`, so the harness must
    /// generate `main` around it.
    pub fn needs_driver(&self) -> bool {
        matches!(self, Platform::LeetCode)
    }

    pub fn reformats_input(&self) -> bool {
        matches!(self, Platform::LeetCode)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|platform| platform.key() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown platform '{}' (expected one of: codeforces, leetcode, atcoder, hackerrank)",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_header_comment() {
        assert_eq!(
            Platform::detect("// LeetCode: https://leetcode.com/problems/two-sum\n"),
            Platform::LeetCode
        );
        assert_eq!(Platform::detect("// atcoder abc300_a\n"), Platform::AtCoder);
        assert_eq!(
            Platform::detect("// HackerRank: solve me first\n"),
            Platform::HackerRank
        );
    }

    #[test]
    fn test_detect_falls_back_to_codeforces() {
        assert_eq!(Platform::detect("#include <bits/stdc++.h>\n"), Platform::Codeforces);
        assert_eq!(Platform::detect(""), Platform::Codeforces);
    }

    #[test]
    fn test_only_first_line_counts() {
        let source = "// Codeforces 4A\n// leetcode style notes\n";
        assert_eq!(Platform::detect(source), Platform::Codeforces);
    }

    #[test]
    fn test_policy() {
        assert!(Platform::LeetCode.needs_driver());
        assert!(Platform::LeetCode.reformats_input());
        assert_eq!(Platform::LeetCode.case_layout(), CaseLayout::Keyed);
        assert!(!Platform::AtCoder.needs_driver());
        assert_eq!(Platform::Codeforces.case_layout(), CaseLayout::Freeform);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("LeetCode".parse::<Platform>(), Ok(Platform::LeetCode));
        assert_eq!(" hackerrank ".parse::<Platform>(), Ok(Platform::HackerRank));
        assert!("topcoder".parse::<Platform>().is_err());
    }
}
