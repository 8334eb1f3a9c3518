//! Tabrow - Declarative tabular data generation driven by templating.
//!
//! Tabrow turns a column specification plus a sequence of loop items
//! into an ordered list of rows. Each column is a named expression;
//! each loop item seeds one row; every expression is evaluated against
//! a namespace of caller-supplied variables with the current item bound
//! under a configurable name.
//!
//! The expression language itself is pluggable: the core talks to an
//! [`ExpressionEvaluator`] and ships no engine of its own. The
//! `tabrow-minijinja` crate provides the default implementation.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::{json, Map, Value};
//! use tabrow::{ExpressionEvaluator, EvalError, TableSpec};
//!
//! // A toy evaluator: bare strings resolve as namespace lookups.
//! struct Lookup;
//!
//! impl ExpressionEvaluator for Lookup {
//!     fn evaluate(
//!         &self,
//!         expr: &Value,
//!         namespace: &Map<String, Value>,
//!         _delimiters: (&str, &str),
//!         _convert_bare: bool,
//!     ) -> Result<Value, EvalError> {
//!         match expr.as_str() {
//!             Some(name) => namespace
//!                 .get(name)
//!                 .cloned()
//!                 .ok_or_else(|| EvalError::Undefined(name.to_string())),
//!             None => Ok(expr.clone()),
//!         }
//!     }
//! }
//!
//! let spec = TableSpec::from_value(&json!({
//!     "columns": { "greeting": "hello", "seed": "item" },
//!     "loop": ["a", "b"],
//! })).unwrap();
//!
//! let Value::Object(variables) = json!({ "hello": "world" }) else { unreachable!() };
//!
//! let rows = tabrow::generate(&spec, &variables, &Lookup).unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].get("greeting"), Some(&json!("world")));
//! assert_eq!(rows[1].get("seed"), Some(&json!("b")));
//! ```
//!
//! # Generation Semantics
//!
//! For each loop item, in order:
//!
//! 1. A fresh namespace is built from the base variables (the caller's
//!    map is never mutated).
//! 2. The item is bound under `template_control.loop_var` (`"item"` by
//!    default).
//! 3. Columns evaluate in declaration order. With
//!    `allow_row_templating`, the row built so far is folded into the
//!    item binding after every column, so later columns can reference
//!    earlier ones as fields of the loop variable.
//! 4. With `merge_with_item`, the item's fields are folded into the
//!    finished row, item fields winning on collision.
//!
//! Both merge toggles require every loop item to be a mapping; a
//! non-mapping item fails the whole table, not just that row.
//!
//! # Errors
//!
//! Failures are all-or-nothing at table granularity: a bad spec, a
//! failed expression, or a non-mapping item under a merge toggle aborts
//! the table with the column name, item index, or flag that triggered
//! it. See [`TabrowError`].

mod error;
mod evaluator;
mod generate;
mod spec;

// Re-export public API
pub use error::{EvalError, Result, TabrowError};
pub use evaluator::ExpressionEvaluator;
pub use generate::{generate, generate_all, Row};
pub use spec::{TableSpec, TemplateControl};
