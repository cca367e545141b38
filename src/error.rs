//! Error types and handling for the formula-rs crate.
//!
//! Every stage of the pipeline (tokenizer, compiler, evaluator, adapter) fails fast with an
//! [`ExprError`]. The typed adapter wraps whatever went wrong in an [`AdaptError`] that also
//! carries the formula text, so tooling only needs to show one message per malformed formula.

use std::result;

/// Result type used throughout the crate.
///
/// This is a convenience type alias that uses the `ExprError` type for the error variant.
pub type Result<T> = result::Result<T, ExprError>;

/// Error type for formula tokenization, compilation and evaluation.
///
/// None of these are fatal: a malformed formula is a deterministic input error and the
/// caller decides what to show or fall back to.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// A run of characters could not be split into number literals and known identifiers.
    ///
    /// Identifiers are resolved against the engine's variables first and its functions
    /// second. To make a name known, register it with `Engine::set_variable`.
    #[error("Unknown token: '{token}'")]
    UnknownToken { token: String },

    /// A closing parenthesis without an opening one, or an opening one that is never closed.
    #[error("Unbalanced parenthesis")]
    UnbalancedParenthesis,

    /// A comma at the start of an argument group, or right after another comma.
    #[error("Misplaced separator")]
    MisplacedSeparator,

    /// The formula is empty, compiles to nothing, or leaves more than one value behind.
    #[error("Invalid equation: {0}")]
    InvalidEquation(String),

    /// An operator symbol that is not in the engine's operator table, or that has no rule
    /// for the position it was used in (e.g. a binary-only symbol used as unary).
    #[error("Invalid operator: '{symbol}'")]
    InvalidOperator { symbol: char },

    /// A missing operand, or an operand of the wrong shape (a tuple where a scalar is needed).
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    /// A function name that is not in the engine's function table.
    #[error("Invalid function: '{name}'")]
    InvalidFunction { name: String },

    /// A function called with more arguments than it takes.
    #[error("Invalid parameters for '{name}': expected {expected} arguments, found {found}")]
    InvalidFunctionParameters {
        /// Name of the function that was called
        name: String,
        /// Declared number of arguments
        expected: usize,
        /// Number of arguments bound to the call
        found: usize,
    },

    /// A function called with fewer arguments than it takes, or with fewer values on the
    /// evaluation stack than its call site claims.
    #[error("Not enough parameters for '{name}': expected {expected} arguments, found {found}")]
    NotEnoughFunctionParameters {
        /// Name of the function that was called
        name: String,
        /// Declared number of arguments
        expected: usize,
        /// Number of arguments actually available
        found: usize,
    },

    /// The formula's result arity does not fit the requested output type.
    #[error("Invalid return type: a {found}-component result cannot become {expected}")]
    InvalidReturnType {
        /// Number of components the formula produced
        found: usize,
        /// Name of the requested output type
        expected: &'static str,
    },

    /// A host variable name that the tokenizer could never produce.
    #[error("Invalid variable name: '{name}'")]
    InvalidVariableName { name: String },
}

/// Failure of the typed adapter: "unable to evaluate expression", with the formula text.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Unable to evaluate expression '{expression}': {source}")]
pub struct AdaptError {
    /// The formula exactly as the caller supplied it
    pub expression: String,
    /// The first error raised by the pipeline
    #[source]
    pub source: ExprError,
}

impl AdaptError {
    pub fn new(expression: impl Into<String>, source: ExprError) -> Self {
        Self {
            expression: expression.into(),
            source,
        }
    }
}
