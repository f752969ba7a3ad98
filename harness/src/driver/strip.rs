//! Entry-point stripping
//!
//! Removes `int main(...) { ... }` (or `signed main`) from a source file so
//! the generated driver can supply its own. Braces are matched at full depth
//! on the token stream, so nested blocks, comments and string literals inside
//! `main` are handled.

use thiserror::Error;

use crate::signature::scanner::{matching_close, tokenize, Token, TokenKind};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StripError {
    #[error("entry point at byte {offset} has no matching closing brace")]
    Unbalanced { offset: usize },
}

/// Return `source` without its entry point.
///
/// A source without `main` is returned unchanged.
pub fn strip_entry_point(source: &str) -> Result<String, StripError> {
    let tokens = tokenize(source);

    let Some(start) = find_entry_point(&tokens) else {
        return Ok(source.to_string());
    };
    let offset = tokens[start].start;
    let unbalanced = || StripError::Unbalanced { offset };

    let paren = start + 2;
    let paren_close = matching_close(&tokens, paren).ok_or_else(unbalanced)?;
    let brace = tokens[paren_close + 1..]
        .iter()
        .position(|t| t.kind != TokenKind::Word)
        .map(|pos| paren_close + 1 + pos)
        .filter(|&idx| tokens[idx].kind == TokenKind::LBrace)
        .ok_or_else(unbalanced)?;
    let brace_close = matching_close(&tokens, brace).ok_or_else(unbalanced)?;

    let mut stripped = String::with_capacity(source.len());
    stripped.push_str(&source[..offset]);
    stripped.push_str(&source[tokens[brace_close].end..]);
    Ok(stripped)
}

fn find_entry_point(tokens: &[Token<'_>]) -> Option<usize> {
    tokens.windows(3).position(|w| {
        (w[0].is_word("int") || w[0].is_word("signed"))
            && w[1].is_word("main")
            && w[2].kind == TokenKind::LParen
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_nested_main() {
        let source = "class Solution {};\n\nint main() {\n    for (int i = 0; i < 3; i++) {\n        if (i) { puts(\"}\"); }\n    }\n    return 0;\n}\n// after\n";
        let stripped = strip_entry_point(source).unwrap();

        assert_eq!(stripped, "class Solution {};\n\n\n// after\n");
    }

    #[test]
    fn test_strips_signed_main_with_arguments() {
        let source = "#define int long long\nsigned main(int argc, char** argv) { return 0; }";
        assert_eq!(strip_entry_point(source).unwrap(), "#define int long long\n");
    }

    #[test]
    fn test_source_without_main_is_unchanged() {
        let source = "class Solution { public: int f() { return 1; } };";
        assert_eq!(strip_entry_point(source).unwrap(), source);
    }

    #[test]
    fn test_main_in_comment_is_ignored() {
        let source = "// int main() {\nint x;";
        assert_eq!(strip_entry_point(source).unwrap(), source);
    }

    #[test]
    fn test_unbalanced_main() {
        let source = "int y;\nint main() {\n    if (true) {\n    return 0;\n}";
        assert_eq!(
            strip_entry_point(source),
            Err(StripError::Unbalanced { offset: 7 })
        );
    }

    #[test]
    fn test_prototype_without_body_is_unbalanced() {
        assert!(strip_entry_point("int main();").is_err());
    }
}
