//! Error types for the tabrow crate.

use thiserror::Error;

/// Errors produced by an [`ExpressionEvaluator`](crate::ExpressionEvaluator).
///
/// Evaluator implementations map their backend's failures onto these
/// variants so the core can report them without depending on any
/// particular template engine.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The expression could not be parsed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The expression referenced a name not present in the namespace.
    #[error("undefined reference: {0}")]
    Undefined(String),

    /// Any other evaluation failure.
    #[error("{0}")]
    Other(String),
}

/// Errors that can occur while validating a table spec or generating rows.
#[derive(Debug, Error)]
pub enum TabrowError {
    /// The raw table spec is not a mapping.
    #[error("table spec must be a mapping")]
    NotAMapping,

    /// A required table spec field is absent.
    #[error("table spec is missing required field '{0}'")]
    MissingField(&'static str),

    /// A table spec field has the wrong shape.
    #[error("table spec field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// The table spec carries a field the schema does not define.
    #[error("unknown table spec field '{0}'")]
    UnknownField(String),

    /// `template_control` carries an option the schema does not define.
    #[error("unknown template_control option '{0}'")]
    UnknownOption(String),

    /// A `template_control` option has the wrong type.
    #[error("template_control option '{option}' must be {expected}")]
    InvalidOptionType {
        option: String,
        expected: &'static str,
    },

    /// A loop item is not a mapping but the named control flag needs one.
    #[error("loop item {index} must be a mapping when {flag} is enabled")]
    MappingRequired { flag: &'static str, index: usize },

    /// A column expression failed to evaluate.
    #[error("column '{column}' failed for loop item {index}")]
    Evaluation {
        column: String,
        index: usize,
        #[source]
        source: EvalError,
    },
}

/// Result type for tabrow operations.
pub type Result<T> = std::result::Result<T, TabrowError>;
