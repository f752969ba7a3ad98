//! C++ rendering of a `DriverPlan`

use std::fmt::Write;

use tracing::warn;

use super::plan::{DriverPlan, ParseStep, ReadRule, WriteRule};
use super::strip::strip_entry_point;

pub const DRIVER_MARKER: &str = "// Generated by cp-harness. Edits are overwritten on every run.";

const INCLUDES: [&str; 5] = ["iostream", "sstream", "iomanip", "string", "vector"];

const SOLUTION_VAR: &str = "harness_solution";
const RESULT_VAR: &str = "harness_result";

/// Trim and unquote helpers used by the sequence readers
const HELPERS: &str = r#"namespace harness_driver {
inline std::string trim(const std::string& s) {
    const auto first = s.find_first_not_of(" \t\r\n");
    if (first == std::string::npos) return "";
    const auto last = s.find_last_not_of(" \t\r\n");
    return s.substr(first, last - first + 1);
}

inline std::string unquote(const std::string& s) {
    if (s.size() >= 2 && (s.front() == '"' || s.front() == '\'') && s.back() == s.front()) {
        return s.substr(1, s.size() - 2);
    }
    return s;
}

inline std::vector<std::string> bracketed_items(std::string line) {
    line = trim(line);
    if (!line.empty() && line.front() == '[') line.erase(0, 1);
    if (!line.empty() && line.back() == ']') line.pop_back();
    std::vector<std::string> items;
    std::stringstream ss(line);
    std::string item;
    while (std::getline(ss, item, ',')) {
        item = trim(item);
        if (!item.empty()) items.push_back(item);
    }
    return items;
}

inline std::string read_line() {
    std::string line;
    std::getline(std::cin >> std::ws, line);
    return line;
}
}  // namespace harness_driver
"#;

/// Render a complete translation unit: marker, includes, the user's source
/// without its entry point, helpers and the generated `main`.
pub fn render(plan: &DriverPlan, source: &str) -> String {
    let body = match strip_entry_point(source) {
        Ok(stripped) => stripped,
        Err(e) => {
            warn!("Could not strip entry point ({}); using source unchanged", e);
            source.to_string()
        }
    };

    let mut out = String::new();
    out.push_str(DRIVER_MARKER);
    out.push('\n');
    for header in INCLUDES {
        let _ = writeln!(out, "#include <{}>", header);
    }
    out.push('\n');
    out.push_str(body.trim_end());
    out.push_str("\n\n");
    out.push_str(HELPERS);
    out.push('\n');
    out.push_str(&render_main(plan));
    out
}

fn render_main(plan: &DriverPlan) -> String {
    let mut out = String::new();
    out.push_str("int main() {\n");
    out.push_str("    std::ios_base::sync_with_stdio(false);\n");
    out.push_str("    std::cin.tie(nullptr);\n\n");
    let _ = writeln!(out, "    Solution {};", SOLUTION_VAR);

    for step in &plan.steps {
        out.push_str(&render_step(step));
    }

    let call = format!("{}.{}({})", SOLUTION_VAR, plan.method, plan.call_arguments());
    out.push('\n');
    match plan.output.write {
        WriteRule::CallOnly => {
            let _ = writeln!(out, "    {};", call);
        }
        write => {
            let _ = writeln!(out, "    const auto {} = {};", RESULT_VAR, call);
            out.push_str(&render_output(write));
        }
    }

    out.push_str("    return 0;\n}\n");
    out
}

fn render_step(step: &ParseStep) -> String {
    let var = &step.variable;
    let mut out = format!("    {} {};\n", step.cpp_type, var);

    match step.read {
        ReadRule::BracketedIntegers => {
            let _ = writeln!(
                out,
                "    for (const auto& item : harness_driver::bracketed_items(harness_driver::read_line())) {}.push_back(std::stoi(item));",
                var
            );
        }
        ReadRule::BracketedStrings => {
            let _ = writeln!(
                out,
                "    for (const auto& item : harness_driver::bracketed_items(harness_driver::read_line())) {}.push_back(harness_driver::unquote(item));",
                var
            );
        }
        ReadRule::BoolToken => {
            let _ = writeln!(out, "    std::cin >> std::boolalpha >> {};", var);
        }
        ReadRule::Token => {
            let _ = writeln!(out, "    std::cin >> {};", var);
        }
    }
    out
}

fn render_output(write: WriteRule) -> String {
    match write {
        WriteRule::BracketedIntegers => sequence_printer("item"),
        WriteRule::BracketedQuotedStrings => sequence_printer("'\"' << item << '\"'"),
        WriteRule::FixedPoint => format!(
            "    std::cout << std::fixed << std::setprecision(5) << {} << '\\n';\n",
            RESULT_VAR
        ),
        WriteRule::BoolLiteral => format!(
            "    std::cout << ({} ? \"true\" : \"false\") << '\\n';\n",
            RESULT_VAR
        ),
        WriteRule::Plain | WriteRule::Fallback => {
            format!("    std::cout << {} << '\\n';\n", RESULT_VAR)
        }
        WriteRule::CallOnly => String::new(),
    }
}

fn sequence_printer(element: &str) -> String {
    format!(
        "    std::cout << '[';\n    bool harness_first = true;\n    for (const auto& item : {}) {{\n        if (!harness_first) std::cout << ',';\n        harness_first = false;\n        std::cout << {};\n    }}\n    std::cout << ']' << '\\n';\n",
        RESULT_VAR, element
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{CallableSignature, ParameterSpec};

    const SOURCE: &str = "// LeetCode\n#include <vector>\nusing namespace std;\n\nclass Solution {\npublic:\n    vector<int> twoSum(vector<int>& nums, int target) { return {0, 1}; }\n};\n\nint main() {\n    Solution s;\n    return 0;\n}\n";

    fn two_sum_plan() -> DriverPlan {
        let sig = CallableSignature::new(
            "vector<int>",
            "twoSum",
            vec![
                ParameterSpec::new("vector<int>&", "nums"),
                ParameterSpec::new("int", "target"),
            ],
        );
        DriverPlan::build(&sig, "[2,7,11,15] 9")
    }

    #[test]
    fn test_layout() {
        let driver = render(&two_sum_plan(), SOURCE);

        assert!(driver.starts_with(DRIVER_MARKER));
        for header in INCLUDES {
            assert!(driver.contains(&format!("#include <{}>", header)));
        }
        let class_at = driver.find("class Solution").unwrap();
        let helpers_at = driver.find("namespace harness_driver").unwrap();
        let main_at = driver.find("int main() {").unwrap();
        assert!(class_at < helpers_at && helpers_at < main_at);
        assert_eq!(driver.matches("int main(").count(), 1, "original main stripped");
        assert!(!driver.contains("Solution s;"));
    }

    #[test]
    fn test_two_sum_main() {
        let driver = render(&two_sum_plan(), SOURCE);

        assert!(driver.contains("    std::vector<int> nums;\n"));
        assert!(driver.contains("nums.push_back(std::stoi(item));"));
        assert!(driver.contains("    int target;\n    std::cin >> target;\n"));
        assert!(driver.contains("const auto harness_result = harness_solution.twoSum(nums, target);"));
        assert!(driver.contains("std::cout << '[';"));
        assert!(driver.contains("std::cout << ']' << '\\n';"));
    }

    #[test]
    fn test_scalar_and_void_outputs() {
        let sig = CallableSignature::new(
            "int",
            "sum",
            vec![ParameterSpec::new("vector<int>&", "nums")],
        );
        let driver = render(&DriverPlan::build(&sig, "[1,2,3]"), "class Solution {};");
        assert!(driver.contains("    std::cout << harness_result << '\\n';\n"));

        let sig = CallableSignature::new("void", "touch", Vec::new());
        let driver = render(&DriverPlan::build(&sig, ""), "class Solution {};");
        assert!(driver.contains("    harness_solution.touch();\n"));
        assert!(!driver.contains("harness_result"));
    }

    #[test]
    fn test_float_and_bool_outputs() {
        let sig = CallableSignature::new("double", "avg", Vec::new());
        let driver = render(&DriverPlan::build(&sig, ""), "");
        assert!(driver.contains("std::fixed << std::setprecision(5) << harness_result"));

        let sig = CallableSignature::new("bool", "ok", vec![ParameterSpec::new("bool", "b")]);
        let driver = render(&DriverPlan::build(&sig, "true"), "");
        assert!(driver.contains("(harness_result ? \"true\" : \"false\")"));
        assert!(driver.contains("std::cin >> std::boolalpha >> b;"));
    }

    #[test]
    fn test_text_sequence_unquotes() {
        let sig = CallableSignature::new(
            "vector<string>",
            "echo",
            vec![ParameterSpec::new("vector<string>&", "words")],
        );
        let driver = render(&DriverPlan::build(&sig, "[\"a\",\"b\"]"), "");

        assert!(driver.contains("std::vector<std::string> words;"));
        assert!(driver.contains("words.push_back(harness_driver::unquote(item));"));
        assert!(driver.contains("std::cout << '\"' << item << '\"';"));
    }

    #[test]
    fn test_unbalanced_source_is_kept() {
        let source = "class Solution {};\nint main() {\n";
        let driver = render(&two_sum_plan(), source);
        assert!(driver.contains("class Solution {};\nint main() {\n"));
    }
}
