//! Expression evaluator abstraction.
//!
//! This module defines the [`ExpressionEvaluator`] trait which allows
//! tabrow to work with different expression backends. The core never
//! interprets expression text itself; it hands each column expression to
//! the evaluator along with the namespace built for the current row.
//!
//! The default implementation lives in the `tabrow-minijinja` crate.
//! Hosts that embed their own template engine implement this trait
//! instead.

use serde_json::{Map, Value};

use crate::error::EvalError;

/// A capability that evaluates one expression against a namespace.
///
/// Implementations must honor the literal-passthrough contract:
///
/// - a non-string `expr` is returned unchanged;
/// - a string `expr` containing no occurrence of the start delimiter is
///   returned unchanged when `convert_bare` is `false`, and evaluated as
///   a bare expression when `convert_bare` is `true`;
/// - any other string is treated as a template/expression bounded by the
///   given delimiters.
///
/// Evaluation results may be any value type, not just strings: an
/// expression resolving to a mapping or sequence yields that mapping or
/// sequence.
pub trait ExpressionEvaluator {
    /// Evaluates `expr` against `namespace`.
    ///
    /// `delimiters` is the `(start, end)` pair the current table
    /// configured; `convert_bare` controls whether delimiter-free
    /// strings are still expressions.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is malformed or references a
    /// name absent from `namespace`.
    fn evaluate(
        &self,
        expr: &Value,
        namespace: &Map<String, Value>,
        delimiters: (&str, &str),
        convert_bare: bool,
    ) -> Result<Value, EvalError>;
}
