//! Driver plan - typed description of the generated entry point
//!
//! A plan is built from the extracted signature before any C++ text exists:
//! one `ParseStep` per parameter in call order, then a single `OutputStep`.
//! Rendering only walks the plan.

use serde::Serialize;
use tracing::debug;

use crate::signature::{base_type, CallableSignature, TypeTag};

/// How one argument is read from stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadRule {
    /// One line like `[1,2,3]` split on commas into integers
    BracketedIntegers,
    /// One line like `["a","b"]` split on commas, one quote layer removed
    BracketedStrings,
    /// `true` / `false` token
    BoolToken,
    /// One whitespace-delimited token through `operator>>`
    Token,
}

impl ReadRule {
    pub fn for_tag(tag: TypeTag) -> Self {
        match tag {
            TypeTag::IntegerSequence => ReadRule::BracketedIntegers,
            TypeTag::TextSequence => ReadRule::BracketedStrings,
            TypeTag::Boolean => ReadRule::BoolToken,
            TypeTag::Integer
            | TypeTag::Float
            | TypeTag::Character
            | TypeTag::Text
            | TypeTag::Unknown => ReadRule::Token,
        }
    }
}

/// How the call result is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteRule {
    /// `[a,b,c]`
    BracketedIntegers,
    /// `["a","b"]`
    BracketedQuotedStrings,
    /// `operator<<` as-is
    Plain,
    /// Fixed-point with five decimals
    FixedPoint,
    /// `true` / `false`
    BoolLiteral,
    /// Unrecognized type, default stream form
    Fallback,
    /// `void` method, call only
    CallOnly,
}

impl WriteRule {
    pub fn for_return(tag: TypeTag, declared: &str) -> Self {
        match tag {
            TypeTag::IntegerSequence => WriteRule::BracketedIntegers,
            TypeTag::TextSequence => WriteRule::BracketedQuotedStrings,
            TypeTag::Integer | TypeTag::Text | TypeTag::Character => WriteRule::Plain,
            TypeTag::Float => WriteRule::FixedPoint,
            TypeTag::Boolean => WriteRule::BoolLiteral,
            TypeTag::Unknown if base_type(declared) == "void" => WriteRule::CallOnly,
            TypeTag::Unknown => WriteRule::Fallback,
        }
    }
}

/// Declare a variable, then fill it from stdin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseStep {
    /// Variable name, also the positional call argument
    pub variable: String,
    /// C++ type used in the declaration
    pub cpp_type: String,
    pub read: ReadRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputStep {
    pub write: WriteRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverPlan {
    /// Method invoked on the `Solution` instance
    pub method: String,
    pub steps: Vec<ParseStep>,
    pub output: OutputStep,
    /// Whitespace token count of the sample input, informational only
    pub sample_tokens: usize,
}

impl DriverPlan {
    pub fn build(signature: &CallableSignature, sample_input: &str) -> Self {
        let steps: Vec<ParseStep> = signature
            .parameters
            .iter()
            .map(|param| ParseStep {
                variable: param.name.clone(),
                cpp_type: cpp_type(param.tag, &param.declared),
                read: ReadRule::for_tag(param.tag),
            })
            .collect();

        let sample_tokens = sample_input.split_whitespace().count();
        if sample_tokens != steps.len() {
            debug!(
                "Sample input has {} tokens but {} takes {} parameters",
                sample_tokens,
                signature.name,
                steps.len()
            );
        }

        let plan = Self {
            method: signature.name.clone(),
            steps,
            output: OutputStep {
                write: WriteRule::for_return(signature.return_tag, &signature.return_declared),
            },
            sample_tokens,
        };
        debug!("Driver plan: {:?}", plan);
        plan
    }

    /// Comma-separated call arguments in declaration order
    pub fn call_arguments(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.variable.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Variable type for a parameter: fully qualified for known shapes, the
/// declared type without qualifiers otherwise.
fn cpp_type(tag: TypeTag, declared: &str) -> String {
    match tag {
        TypeTag::IntegerSequence => "std::vector<int>".to_string(),
        TypeTag::TextSequence => "std::vector<std::string>".to_string(),
        TypeTag::Text => "std::string".to_string(),
        TypeTag::Integer
        | TypeTag::Float
        | TypeTag::Boolean
        | TypeTag::Character
        | TypeTag::Unknown => base_type(declared),
    }
}
