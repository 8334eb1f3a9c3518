//! MiniJinja-backed expression evaluator for tabrow.
//!
//! This crate provides [`MiniJinjaEvaluator`], the default
//! [`ExpressionEvaluator`] implementation. It supports the full Jinja
//! expression language (variables, attribute access, operators,
//! filters) and honors per-table delimiter overrides via minijinja's
//! custom syntax support.
//!
//! # Evaluation Rules
//!
//! - A non-string expression is returned unchanged.
//! - A string without the start delimiter is returned unchanged when
//!   `convert_bare` is `false`, and evaluated as a bare expression when
//!   it is `true` (`"hello | upper"` is a valid bare expression).
//! - A string that is exactly one delimited span (`"{{ item }}"`) is
//!   evaluated as an expression and keeps its native result type: a
//!   mapping item comes back as a mapping, a number as a number.
//! - Any other delimited string is rendered as a template and yields a
//!   string (`"{{ a }}-{{ b }}"`).
//!
//! Undefined references are hard errors, not silent empties: the
//! environment runs with [`UndefinedBehavior::Strict`].
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use tabrow::TableSpec;
//! use tabrow_minijinja::MiniJinjaEvaluator;
//!
//! let spec = TableSpec::from_value(&json!({
//!     "columns": { "shout": "greeting | upper", "seed": "item" },
//!     "loop": ["a", "b"],
//! })).unwrap();
//!
//! let serde_json::Value::Object(vars) = json!({ "greeting": "hello" }) else {
//!     unreachable!()
//! };
//!
//! let rows = tabrow::generate(&spec, &vars, &MiniJinjaEvaluator::new()).unwrap();
//! assert_eq!(rows[0].get("shout"), Some(&json!("HELLO")));
//! assert_eq!(rows[1].get("seed"), Some(&json!("b")));
//! ```

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_json::{Map, Value};

use tabrow::{EvalError, ExpressionEvaluator};

/// The default expression evaluator, backed by a MiniJinja environment.
pub struct MiniJinjaEvaluator {
    env: Environment<'static>,
}

impl MiniJinjaEvaluator {
    /// Creates an evaluator with strict undefined-variable behavior.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    /// Returns a mutable reference to the underlying environment.
    ///
    /// Hosts use this to register custom filters or functions that
    /// column expressions can then call.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    /// Evaluates a bare expression, preserving the native result type.
    fn eval_expression(
        &self,
        expr: &str,
        namespace: &Map<String, Value>,
    ) -> Result<Value, EvalError> {
        let compiled = self
            .env
            .compile_expression_owned(expr.to_string())
            .map_err(eval_error)?;
        let result = compiled.eval(namespace).map_err(eval_error)?;
        serde_json::to_value(result).map_err(|err| EvalError::Other(err.to_string()))
    }

    /// Renders a template string with the table's delimiters.
    fn render_template(
        &self,
        template: &str,
        namespace: &Map<String, Value>,
        start: &str,
        end: &str,
    ) -> Result<Value, EvalError> {
        let mut env = self.env.clone();
        let syntax = SyntaxConfig::builder()
            .variable_delimiters(start.to_string(), end.to_string())
            .build()
            .map_err(eval_error)?;
        env.set_syntax(syntax);
        let rendered = env.render_str(template, namespace).map_err(eval_error)?;
        Ok(Value::String(rendered))
    }
}

impl Default for MiniJinjaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator for MiniJinjaEvaluator {
    fn evaluate(
        &self,
        expr: &Value,
        namespace: &Map<String, Value>,
        delimiters: (&str, &str),
        convert_bare: bool,
    ) -> Result<Value, EvalError> {
        let Some(text) = expr.as_str() else {
            return Ok(expr.clone());
        };
        let (start, end) = delimiters;

        if !text.contains(start) {
            if !convert_bare {
                return Ok(expr.clone());
            }
            return self.eval_expression(text, namespace);
        }

        // A single delimited span spanning the whole string evaluates as
        // an expression so non-string results keep their type.
        let trimmed = text.trim();
        if trimmed.len() >= start.len() + end.len()
            && trimmed.starts_with(start)
            && trimmed.ends_with(end)
        {
            let inner = &trimmed[start.len()..trimmed.len() - end.len()];
            if !inner.contains(start) {
                return self.eval_expression(inner, namespace);
            }
        }

        self.render_template(text, namespace, start, end)
    }
}

fn eval_error(err: minijinja::Error) -> EvalError {
    match err.kind() {
        ErrorKind::UndefinedError => EvalError::Undefined(err.to_string()),
        ErrorKind::SyntaxError
        | ErrorKind::BadEscape
        | ErrorKind::UnknownTest
        | ErrorKind::UnknownFunction
        | ErrorKind::UnknownFilter
        | ErrorKind::UnknownMethod => EvalError::Syntax(err.to_string()),
        _ => EvalError::Other(err.to_string()),
    }
}
