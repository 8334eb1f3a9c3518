//! The row generator.
//!
//! For each loop item, a fresh namespace is built from the caller's base
//! variables, the item is bound under the configured loop variable, and
//! every column expression is evaluated in declaration order. Two
//! post-processing toggles exist:
//!
//! - `allow_row_templating` folds the row built so far back into the
//!   loop-item binding after every column, so later columns of the same
//!   row can reference earlier ones (`item.earlier_column`).
//! - `merge_with_item` folds the loop item's own fields into the
//!   finished row, with the item's fields winning on collision.
//!
//! The loop item is never mutated in place: the generator works on an
//! owned per-row copy, so the caller's spec and variables are untouched
//! and nothing leaks between rows.

use serde_json::{Map, Value};

use crate::error::{Result, TabrowError};
use crate::evaluator::ExpressionEvaluator;
use crate::spec::TableSpec;

/// One output row: an ordered column name → value mapping.
pub type Row = Map<String, Value>;

/// Generates the rows for one validated table spec.
///
/// Produces exactly one row per loop item, in loop order. `variables` is
/// read-only; each row evaluates against its own copy.
///
/// # Errors
///
/// Returns an error if any column expression fails to evaluate, or if
/// `merge_with_item` / `allow_row_templating` is enabled and a loop item
/// is not a mapping. A failure aborts the whole table: no partial row
/// sequence is returned.
pub fn generate(
    spec: &TableSpec,
    variables: &Map<String, Value>,
    evaluator: &dyn ExpressionEvaluator,
) -> Result<Vec<Row>> {
    let control = &spec.control;
    let delimiters = (
        control.variable_start_string.as_str(),
        control.variable_end_string.as_str(),
    );

    let mut rows = Vec::with_capacity(spec.items.len());
    for (index, seed) in spec.items.iter().enumerate() {
        // Owned per-row state: the item copy accumulates row values under
        // allow_row_templating instead of aliasing the spec's item.
        let mut item = seed.clone();
        let mut namespace = variables.clone();
        namespace.insert(control.loop_var.clone(), item.clone());

        let mut row = Row::new();
        for (name, expr) in &spec.columns {
            let value = evaluator
                .evaluate(expr, &namespace, delimiters, control.convert_bare)
                .map_err(|source| TabrowError::Evaluation {
                    column: name.clone(),
                    index,
                    source,
                })?;
            row.insert(name.clone(), value);

            if control.allow_row_templating {
                let fields = item.as_object_mut().ok_or(TabrowError::MappingRequired {
                    flag: "allow_row_templating",
                    index,
                })?;
                for (key, value) in &row {
                    fields.insert(key.clone(), value.clone());
                }
                // Re-bind so the next column sees the updated item.
                namespace.insert(control.loop_var.clone(), item.clone());
            }
        }

        if control.merge_with_item {
            let fields = item.as_object().ok_or(TabrowError::MappingRequired {
                flag: "merge_with_item",
                index,
            })?;
            for (key, value) in fields {
                row.insert(key.clone(), value.clone());
            }
        }

        rows.push(row);
    }

    Ok(rows)
}

/// Validates and generates a batch of raw table specs.
///
/// This is the invocation surface a host calls with the raw
/// configuration it collected: one row sequence is returned per input
/// spec, in input order.
///
/// The batch is all-or-nothing: the first spec that fails validation or
/// generation aborts the whole call. Callers that want per-table
/// isolation can validate and generate each spec themselves.
///
/// # Example
///
/// ```rust,ignore
/// let tables = tabrow::generate_all(&raw_specs, &variables, &evaluator)?;
/// for (spec_rows, raw) in tables.iter().zip(&raw_specs) {
///     // one Vec<Row> per input spec
/// }
/// ```
pub fn generate_all(
    raw: &[Value],
    variables: &Map<String, Value>,
    evaluator: &dyn ExpressionEvaluator,
) -> Result<Vec<Vec<Row>>> {
    raw.iter()
        .map(|value| {
            let spec = TableSpec::from_value(value)?;
            generate(&spec, variables, evaluator)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use serde_json::json;

    /// Test evaluator that resolves bare strings as dotted paths into
    /// the namespace. Mirrors what a real expression engine does for the
    /// subset these tests need, without pulling one in.
    struct PathEvaluator;

    impl ExpressionEvaluator for PathEvaluator {
        fn evaluate(
            &self,
            expr: &Value,
            namespace: &Map<String, Value>,
            _delimiters: (&str, &str),
            convert_bare: bool,
        ) -> std::result::Result<Value, EvalError> {
            let Some(text) = expr.as_str() else {
                return Ok(expr.clone());
            };
            if !convert_bare {
                return Ok(expr.clone());
            }

            let mut parts = text.split('.');
            let head = parts.next().unwrap_or_default();
            let mut current = namespace
                .get(head)
                .ok_or_else(|| EvalError::Undefined(head.to_string()))?;
            for part in parts {
                current = current
                    .get(part)
                    .ok_or_else(|| EvalError::Undefined(text.to_string()))?;
            }
            Ok(current.clone())
        }
    }

    fn base_variables() -> Map<String, Value> {
        let Value::Object(map) = json!({ "hello": "world", "foo": "bar" }) else {
            unreachable!()
        };
        map
    }

    fn spec(raw: Value) -> TableSpec {
        TableSpec::from_value(&raw).unwrap()
    }

    #[test]
    fn one_row_per_loop_item_in_order() {
        let spec = spec(json!({
            "columns": { "v1": "hello", "v2": "foo", "item": "item" },
            "loop": ["a", "b"],
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("v1"), Some(&json!("world")));
        assert_eq!(rows[0].get("v2"), Some(&json!("bar")));
        assert_eq!(rows[0].get("item"), Some(&json!("a")));
        assert_eq!(rows[1].get("item"), Some(&json!("b")));
    }

    #[test]
    fn row_keys_match_column_declaration_order() {
        let spec = spec(json!({
            "columns": { "z": "hello", "a": "foo" },
            "loop": ["x"],
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn custom_loop_var_binds_the_item() {
        let spec = spec(json!({
            "columns": { "item": "myvar" },
            "loop": ["a", "b"],
            "template_control": { "loop_var": "myvar" },
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("item"), Some(&json!("a")));
        assert_eq!(rows[1].get("item"), Some(&json!("b")));
    }

    #[test]
    fn non_string_expressions_pass_through() {
        let spec = spec(json!({
            "columns": { "n": 42, "list": [1, 2] },
            "loop": ["only"],
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("n"), Some(&json!(42)));
        assert_eq!(rows[0].get("list"), Some(&json!([1, 2])));
    }

    #[test]
    fn merge_with_item_adds_item_fields() {
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": [{ "extra": "z" }],
            "template_control": { "merge_with_item": true },
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("v1"), Some(&json!("world")));
        assert_eq!(rows[0].get("extra"), Some(&json!("z")));
    }

    #[test]
    fn merge_with_item_item_wins_on_collision() {
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": [{ "v1": "from-item" }],
            "template_control": { "merge_with_item": true },
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("v1"), Some(&json!("from-item")));
    }

    #[test]
    fn merge_with_item_requires_mapping_items() {
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": ["a"],
            "template_control": { "merge_with_item": true },
        }));

        let err = generate(&spec, &base_variables(), &PathEvaluator).unwrap_err();
        assert!(matches!(
            err,
            TabrowError::MappingRequired { flag: "merge_with_item", index: 0 }
        ));
    }

    #[test]
    fn row_templating_exposes_earlier_columns() {
        let spec = spec(json!({
            "columns": { "v1": "hello", "echo": "item.v1" },
            "loop": [{ "seed": 1 }],
            "template_control": { "allow_row_templating": true },
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("echo"), Some(&json!("world")));
    }

    #[test]
    fn row_templating_requires_mapping_items() {
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": [42],
            "template_control": { "allow_row_templating": true },
        }));

        let err = generate(&spec, &base_variables(), &PathEvaluator).unwrap_err();
        assert!(matches!(
            err,
            TabrowError::MappingRequired { flag: "allow_row_templating", index: 0 }
        ));
    }

    #[test]
    fn row_templating_does_not_leak_between_rows() {
        // Each row's echo must see its own v1, and the second item must
        // not carry the first row's values.
        let spec = spec(json!({
            "columns": { "v1": "item.seed", "echo": "item.v1" },
            "loop": [{ "seed": "first" }, { "seed": "second" }],
            "template_control": { "allow_row_templating": true },
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("echo"), Some(&json!("first")));
        assert_eq!(rows[1].get("echo"), Some(&json!("second")));
    }

    #[test]
    fn row_templating_with_merge_keeps_item_fields() {
        // Combined flags: the final merge sees the mutated item, so row
        // values survive and the item's own fields come along.
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": [{ "myvar": "abc" }],
            "template_control": {
                "merge_with_item": true,
                "allow_row_templating": true,
            },
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("v1"), Some(&json!("world")));
        assert_eq!(rows[0].get("myvar"), Some(&json!("abc")));
    }

    #[test]
    fn base_variables_are_never_mutated() {
        let variables = base_variables();
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": [{ "hello": "shadow" }],
            "template_control": { "allow_row_templating": true, "merge_with_item": true },
        }));

        generate(&spec, &variables, &PathEvaluator).unwrap();
        assert_eq!(variables, base_variables());
    }

    #[test]
    fn evaluation_failure_aborts_the_table_with_context() {
        let spec = spec(json!({
            "columns": { "good": "hello", "bad": "no_such_var" },
            "loop": ["a", "b"],
        }));

        let err = generate(&spec, &base_variables(), &PathEvaluator).unwrap_err();
        match err {
            TabrowError::Evaluation { column, index, .. } => {
                assert_eq!(column, "bad");
                assert_eq!(index, 0);
            }
            other => panic!("expected Evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn convert_bare_false_passes_strings_through() {
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": ["a"],
            "template_control": { "convert_bare": false },
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(rows[0].get("v1"), Some(&json!("hello")));
    }

    #[test]
    fn empty_loop_produces_no_rows() {
        let spec = spec(json!({
            "columns": { "v1": "hello" },
            "loop": [],
        }));

        let rows = generate(&spec, &base_variables(), &PathEvaluator).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn generate_all_returns_one_sequence_per_spec() {
        let specs = vec![
            json!({ "columns": { "v1": "hello" }, "loop": ["a", "b"] }),
            json!({ "columns": { "v2": "foo" }, "loop": ["c"] }),
        ];

        let tables = generate_all(&specs, &base_variables(), &PathEvaluator).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 2);
        assert_eq!(tables[1].len(), 1);
        assert_eq!(tables[1][0].get("v2"), Some(&json!("bar")));
    }

    #[test]
    fn generate_all_aborts_on_first_invalid_spec() {
        let specs = vec![
            json!({ "columns": { "v1": "hello" }, "loop": ["a"] }),
            json!({ "columns": { "v1": "hello" } }),
        ];

        let err = generate_all(&specs, &base_variables(), &PathEvaluator).unwrap_err();
        assert!(matches!(err, TabrowError::MissingField("loop")));
    }
}
