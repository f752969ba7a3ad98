//! Signature extraction
//!
//! Walks the token stream of a source file to find `class Solution { ... }`,
//! enters its public section and reads the first member function that has a
//! body. Anything unexpected degrades to `CallableSignature::fallback()`.

use tracing::{debug, warn};

use super::scanner::{matching_close, tokenize, Token, TokenKind};
use super::{CallableSignature, ParameterSpec};

const CONTAINER_NAME: &str = "Solution";

/// Extract the method signature of `class Solution`, or the fallback.
pub fn extract_signature(source: &str) -> CallableSignature {
    match find_signature(source) {
        Some(signature) => {
            debug!("Extracted signature: {}", signature);
            signature
        }
        None => {
            let fallback = CallableSignature::fallback();
            warn!(
                "No public method found in class {}; falling back to `{}`",
                CONTAINER_NAME, fallback
            );
            fallback
        }
    }
}

fn find_signature(source: &str) -> Option<CallableSignature> {
    let tokens = tokenize(source);
    let (open, default_public) = find_container(&tokens)?;
    let close = matching_close(&tokens, open)?;
    let body = &tokens[open + 1..close];

    let mut public = default_public;
    let mut decl_start = 0;
    let mut i = 0;

    while i < body.len() {
        let token = &body[i];
        match token.kind {
            TokenKind::Word => {
                if let Some((access, consumed)) = access_specifier(body, i) {
                    public = access == "public";
                    i += consumed;
                    decl_start = i;
                    continue;
                }
            }
            TokenKind::Semicolon => decl_start = i + 1,
            TokenKind::LBrace => {
                let block_close = matching_close(body, i)?;
                if public {
                    let declaration = &body[decl_start..i];
                    if let Some(signature) = parse_declaration(declaration) {
                        return Some(signature);
                    }
                    debug!(
                        "Skipping public member starting at {:?}",
                        declaration.first().map(|t| t.text)
                    );
                }
                i = block_close + 1;
                decl_start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Locate the opening brace of `class Solution` / `struct Solution`.
///
/// Returns the brace index and whether members start out public.
fn find_container(tokens: &[Token<'_>]) -> Option<(usize, bool)> {
    for (idx, pair) in tokens.windows(2).enumerate() {
        let keyword = &pair[0];
        if !(keyword.is_word("class") || keyword.is_word("struct")) {
            continue;
        }
        if pair[1].text.trim_end_matches(':') != CONTAINER_NAME {
            continue;
        }

        // Skip base clauses, stop at forward declarations
        let open = tokens[idx + 2..]
            .iter()
            .position(|t| matches!(t.kind, TokenKind::LBrace | TokenKind::Semicolon))
            .map(|offset| idx + 2 + offset)?;
        if tokens[open].kind == TokenKind::LBrace {
            return Some((open, keyword.is_word("struct")));
        }
    }
    None
}

/// Recognize `public:` or `public :` (and the other access keywords).
fn access_specifier(body: &[Token<'_>], idx: usize) -> Option<(&'static str, usize)> {
    const ACCESS: [&str; 3] = ["public", "protected", "private"];

    let text = body[idx].text;
    for access in ACCESS {
        if text.strip_prefix(access) == Some(":") {
            return Some((access, 1));
        }
        if text == access && body.get(idx + 1).is_some_and(|next| next.is_word(":")) {
            return Some((access, 2));
        }
    }
    None
}

/// Parse the tokens preceding a `{` as `<return type> <name>(<params>)`.
fn parse_declaration(tokens: &[Token<'_>]) -> Option<CallableSignature> {
    let paren = tokens.iter().position(|t| t.kind == TokenKind::LParen)?;
    let paren_close = matching_close(tokens, paren)?;

    let head = &tokens[..paren];
    if head
        .iter()
        .any(|t| !matches!(t.kind, TokenKind::Word | TokenKind::Comma))
    {
        return None;
    }
    let head = join_template_words(head)?;
    // A constructor has no return type
    let (return_declared, name) = head.rsplit_once(' ')?;
    let parameters = parse_parameters(&tokens[paren + 1..paren_close]);

    Some(CallableSignature::new(return_declared, name, parameters))
}

/// Split a parameter list on commas outside template arguments.
fn parse_parameters(tokens: &[Token<'_>]) -> Vec<ParameterSpec> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut depth = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Comma if depth <= 0 => {
                groups.push(&tokens[start..i]);
                start = i + 1;
            }
            TokenKind::Word => depth += angle_delta(token.text),
            _ => {}
        }
    }
    groups.push(&tokens[start..]);

    groups
        .into_iter()
        .filter_map(join_template_words)
        .filter_map(|text| parse_parameter(&text))
        .collect()
}

/// Space-join tokens, gluing commas inside `<...>` so `map<int, int>` stays one
/// word. A comma outside angle brackets gives `None`.
fn join_template_words(tokens: &[Token<'_>]) -> Option<String> {
    let mut text = String::new();
    let mut depth = 0;
    let mut glued = false;
    for token in tokens {
        if token.kind == TokenKind::Comma {
            if depth <= 0 {
                return None;
            }
            text.push(',');
            glued = true;
            continue;
        }
        if !text.is_empty() && !glued {
            text.push(' ');
        }
        text.push_str(token.text);
        if token.kind == TokenKind::Word {
            depth += angle_delta(token.text);
        }
        glued = false;
    }
    Some(text)
}

/// Net template nesting opened by a word (`vector<pair<int` is 2, `int>>` is -2)
fn angle_delta(text: &str) -> isize {
    text.chars()
        .map(|c| match c {
            '<' => 1,
            '>' => -1,
            _ => 0,
        })
        .sum()
}

fn parse_parameter(text: &str) -> Option<ParameterSpec> {
    // Drop default values
    let text = text.split('=').next().unwrap_or("");
    let words: Vec<&str> = text.split_whitespace().collect();
    let (last, type_words) = words.split_last()?;
    if type_words.is_empty() {
        return None;
    }

    let name = last.trim_matches(|c| c == '&' || c == '*');
    if name.is_empty() {
        return None;
    }

    // `vector<int> &nums` declares a `vector<int>&`
    let decoration = &last[..last.len() - last.trim_start_matches(['&', '*']).len()];
    let declared = format!("{}{}", type_words.join(" "), decoration);

    Some(ParameterSpec::new(declared, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::TypeTag;

    const TWO_SUM: &str = r#"// LeetCode: paste link to problem here

#include <iostream>
#include <vector>
#include <map>

using namespace std;

class Solution
{
public:
    vector<int> twoSum(vector<int> &nums, int target)
    {
        map<int, int> numToIndex;

        for (int i = 0; i < nums.size(); i++)
        {
            int complement = target - nums[i];
            if (numToIndex.find(complement) != numToIndex.end())
            {
                return {numToIndex[complement], i};
            }
            numToIndex[nums[i]] = i;
        }
        return {};
    }
};
"#;

    #[test]
    fn test_two_sum_signature() {
        let sig = extract_signature(TWO_SUM);

        assert_eq!(sig.name, "twoSum");
        assert_eq!(sig.return_declared, "vector<int>");
        assert_eq!(sig.return_tag, TypeTag::IntegerSequence);
        assert_eq!(
            sig.parameters,
            vec![
                ParameterSpec::new("vector<int>&", "nums"),
                ParameterSpec::new("int", "target"),
            ]
        );
    }

    #[test]
    fn test_single_sequence_parameter() {
        let source = "class Solution {\npublic:\n    int sum(vector<int>& nums) {\n        return 0;\n    }\n};";
        let sig = extract_signature(source);

        assert_eq!(sig.to_string(), "int sum(vector<int>& nums)");
        assert_eq!(sig.parameters[0].tag, TypeTag::IntegerSequence);
    }

    #[test]
    fn test_multiline_declaration_and_qualifiers() {
        let source = "class Solution {\npublic:\n    bool check(\n        const string& s,\n        int k = 2\n    ) const\n    {\n        return true;\n    }\n};";
        let sig = extract_signature(source);

        assert_eq!(sig.name, "check");
        assert_eq!(sig.return_tag, TypeTag::Boolean);
        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.parameters[0].declared, "const string&");
        assert_eq!(sig.parameters[0].tag, TypeTag::Text);
        assert_eq!(sig.parameters[1].name, "k");
    }

    #[test]
    fn test_private_members_and_constructor_are_skipped() {
        let source = r#"
class Solution {
    int helper(int x) { return x; }
    int cache[10];
public:
    Solution() { cache[0] = 0; }
    double average(vector<int>& xs) { return 0.0; }
};"#;
        let sig = extract_signature(source);

        assert_eq!(sig.name, "average");
        assert_eq!(sig.return_tag, TypeTag::Float);
    }

    #[test]
    fn test_struct_and_spaced_access_specifier() {
        let sig = extract_signature("struct Solution { char first(string s) { return s[0]; } };");
        assert_eq!(sig.name, "first");

        let sig = extract_signature("class Solution { public : long long big() { return 1; } };");
        assert_eq!(sig.return_declared, "long long");
        assert_eq!(sig.return_tag, TypeTag::Integer);
        assert!(sig.parameters.is_empty());
    }

    #[test]
    fn test_pointer_decoration_moves_to_type() {
        let sig =
            extract_signature("class Solution { public: ListNode* rev(ListNode *head) { return head; } };");
        assert_eq!(sig.return_declared, "ListNode*");
        assert_eq!(sig.parameters[0].declared, "ListNode*");
        assert_eq!(sig.parameters[0].name, "head");
        assert_eq!(sig.parameters[0].tag, TypeTag::Unknown);
    }

    #[test]
    fn test_forward_declaration_is_not_the_container() {
        let source = "class Solution;\nclass Solution : public Base {\npublic:\n    int f(int a) { return a; }\n};";
        assert_eq!(extract_signature(source).name, "f");
    }

    #[test]
    fn test_fallback_when_missing() {
        assert!(extract_signature("int main() { return 0; }").is_fallback());
        assert!(extract_signature("class Solution {\npublic:\n    int x;\n};").is_fallback());
        assert!(extract_signature("class Solution { public: int f(int a) {").is_fallback());
        assert!(extract_signature("").is_fallback());
    }

    #[test]
    fn test_braces_in_comments_do_not_confuse_the_walk() {
        let source = "class Solution {\n// }\npublic:\n    /* { */ string name() { return \"}\"; }\n};";
        assert_eq!(extract_signature(source).name, "name");
    }

    #[test]
    fn test_commas_inside_template_arguments() {
        let source = "class Solution {\npublic:\n    pair<int,int> f(vector<int>& a) { return {0, 0}; }\n};";
        let sig = extract_signature(source);

        assert!(!sig.is_fallback());
        assert_eq!(sig.name, "f");
        assert_eq!(sig.return_declared, "pair<int,int>");
        assert_eq!(sig.parameters, vec![ParameterSpec::new("vector<int>&", "a")]);

        let source = "class Solution {\npublic:\n    int count(map<int, int>& m, vector<pair<int, int>> edges, int k) { return 0; }\n};";
        let sig = extract_signature(source);

        assert_eq!(sig.name, "count");
        assert_eq!(
            sig.parameters,
            vec![
                ParameterSpec::new("map<int,int>&", "m"),
                ParameterSpec::new("vector<pair<int,int>>", "edges"),
                ParameterSpec::new("int", "k"),
            ]
        );
    }

    #[test]
    fn test_angle_delta() {
        assert_eq!(angle_delta("vector<pair<int"), 2);
        assert_eq!(angle_delta("int>>&"), -2);
        assert_eq!(angle_delta("int"), 0);
    }
}
