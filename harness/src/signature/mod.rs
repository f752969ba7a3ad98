//! Signature module - callable shape of a `Solution` method
//!
//! - `scanner`: tokenizer with byte spans, shared with entry-point stripping
//! - `extract`: finds the public member function of `class Solution`
//!
//! Declared types are classified into a closed `TypeTag` set which drives
//! both stdin parsing and result printing in the synthesized driver.

pub mod extract;
pub mod scanner;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use extract::extract_signature;

/// Closed set of parameter/return shapes the driver knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Integer,
    Float,
    Boolean,
    Character,
    Text,
    IntegerSequence,
    TextSequence,
    Unknown,
}

const QUALIFIERS: [&str; 6] = ["const", "static", "inline", "virtual", "constexpr", "volatile"];

const INTEGER_TYPES: [&str; 14] = [
    "int",
    "long",
    "long long",
    "long int",
    "long long int",
    "short",
    "unsigned",
    "unsigned int",
    "unsigned long",
    "unsigned long long",
    "signed",
    "size_t",
    "int64_t",
    "int32_t",
];

impl TypeTag {
    /// Classify a declared C++ type such as `const vector<int>&`.
    pub fn classify(declared: &str) -> Self {
        match base_type(declared).as_str() {
            "bool" => TypeTag::Boolean,
            "char" => TypeTag::Character,
            "string" => TypeTag::Text,
            "double" | "float" | "long double" => TypeTag::Float,
            "vector<int>" => TypeTag::IntegerSequence,
            "vector<string>" => TypeTag::TextSequence,
            other if INTEGER_TYPES.contains(&other) => TypeTag::Integer,
            _ => TypeTag::Unknown,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::Boolean => "boolean",
            TypeTag::Character => "character",
            TypeTag::Text => "text",
            TypeTag::IntegerSequence => "integer_sequence",
            TypeTag::TextSequence => "text_sequence",
            TypeTag::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Declared type with qualifiers, references and `std::` removed.
///
/// `const std::vector<int> &` becomes `vector<int>`. Pointers are kept. Used
/// both for classification and as the variable type in generated declarations.
pub fn base_type(declared: &str) -> String {
    let cleaned = declared.replace("std::", "").replace('&', " ");
    let cleaned = cleaned.replace("< ", "<").replace(" >", ">");
    cleaned
        .split_whitespace()
        .filter(|word| !QUALIFIERS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Type text as written, e.g. `vector<int>&`
    pub declared: String,
    pub tag: TypeTag,
    pub name: String,
}

impl ParameterSpec {
    pub fn new(declared: impl Into<String>, name: impl Into<String>) -> Self {
        let declared = declared.into();
        Self {
            tag: TypeTag::classify(&declared),
            declared,
            name: name.into(),
        }
    }
}

/// Return type, name and ordered parameters of the method under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallableSignature {
    pub return_declared: String,
    pub return_tag: TypeTag,
    pub name: String,
    pub parameters: Vec<ParameterSpec>,
}

impl CallableSignature {
    pub fn new(
        return_declared: impl Into<String>,
        name: impl Into<String>,
        parameters: Vec<ParameterSpec>,
    ) -> Self {
        let return_declared = return_declared.into();
        Self {
            return_tag: TypeTag::classify(&return_declared),
            return_declared,
            name: name.into(),
            parameters,
        }
    }

    /// `int solution()`, used when no declaration can be found
    pub fn fallback() -> Self {
        Self::new("int", "solution", Vec::new())
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

impl fmt::Display for CallableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.declared, p.name))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} {}({})", self.return_declared, self.name, params)
    }
}
