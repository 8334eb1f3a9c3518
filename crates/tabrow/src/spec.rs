//! Table spec parsing and validation.
//!
//! A table spec arrives as a raw `serde_json::Value` mapping (typically
//! deserialized from the host's YAML or JSON configuration) and is
//! validated into a typed [`TableSpec`] before any templating happens.
//! Validation is strict: unknown fields and mistyped options are
//! rejected up front, so generation never starts from a half-understood
//! configuration.

use serde_json::{Map, Value};

use crate::error::{Result, TabrowError};

/// Behavioral toggles for row generation.
///
/// Every option is optional in the raw spec; [`TemplateControl::default`]
/// supplies the documented defaults.
///
/// | option | default | effect |
/// |--------|---------|--------|
/// | `loop_var` | `"item"` | name binding the current loop item in the namespace |
/// | `merge_with_item` | `false` | merge the loop item's fields into the finished row |
/// | `allow_row_templating` | `false` | let later columns see earlier columns via the loop item |
/// | `convert_bare` | `true` | evaluate delimiter-free strings as expressions |
/// | `variable_start_string` | `"{{"` | opening expression delimiter |
/// | `variable_end_string` | `"}}"` | closing expression delimiter |
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateControl {
    /// Namespace name under which the current loop item is visible.
    pub loop_var: String,

    /// Merge the loop item's own fields into the finished row, with the
    /// item's fields winning on key collision. Requires every loop item
    /// to be a mapping.
    pub merge_with_item: bool,

    /// After each column evaluates, fold the row built so far back into
    /// the loop-item binding so later columns of the same row can
    /// reference earlier ones. Requires every loop item to be a mapping.
    pub allow_row_templating: bool,

    /// Whether a delimiter-free string expression is still evaluated
    /// (`true`) or passed through as a literal (`false`).
    pub convert_bare: bool,

    /// Opening delimiter recognized by the evaluator for this table.
    pub variable_start_string: String,

    /// Closing delimiter recognized by the evaluator for this table.
    pub variable_end_string: String,
}

impl Default for TemplateControl {
    fn default() -> Self {
        Self {
            loop_var: "item".to_string(),
            merge_with_item: false,
            allow_row_templating: false,
            convert_bare: true,
            variable_start_string: "{{".to_string(),
            variable_end_string: "}}".to_string(),
        }
    }
}

impl TemplateControl {
    /// Validates a raw `template_control` mapping field by field.
    ///
    /// Unknown options and type mismatches are hard errors; omitted
    /// options take their documented defaults.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let fields = raw.as_object().ok_or(TabrowError::InvalidField {
            field: "template_control",
            expected: "a mapping",
        })?;

        let mut control = Self::default();
        for (name, value) in fields {
            match name.as_str() {
                "loop_var" => control.loop_var = expect_string(name, value)?,
                "merge_with_item" => control.merge_with_item = expect_bool(name, value)?,
                "allow_row_templating" => {
                    control.allow_row_templating = expect_bool(name, value)?
                }
                "convert_bare" => control.convert_bare = expect_bool(name, value)?,
                "variable_start_string" => {
                    control.variable_start_string = expect_string(name, value)?
                }
                "variable_end_string" => {
                    control.variable_end_string = expect_string(name, value)?
                }
                _ => return Err(TabrowError::UnknownOption(name.clone())),
            }
        }
        Ok(control)
    }
}

fn expect_string(option: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TabrowError::InvalidOptionType {
            option: option.to_string(),
            expected: "a string",
        })
}

fn expect_bool(option: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| TabrowError::InvalidOptionType {
        option: option.to_string(),
        expected: "a boolean",
    })
}

/// One validated table-generation request.
///
/// Columns are evaluated in declaration order, once per loop item, so a
/// spec with three columns and four loop items yields four rows of three
/// values each (before any `merge_with_item` expansion).
///
/// # Example
///
/// ```rust
/// use tabrow::TableSpec;
/// use serde_json::json;
///
/// let spec = TableSpec::from_value(&json!({
///     "columns": { "greeting": "hello", "seed": "item" },
///     "loop": ["a", "b"],
/// })).unwrap();
///
/// assert_eq!(spec.items.len(), 2);
/// assert_eq!(spec.control.loop_var, "item");
/// ```
#[derive(Debug, Clone)]
pub struct TableSpec {
    /// Ordered column name → expression mapping.
    pub columns: Map<String, Value>,

    /// The loop items driving generation; one output row per item.
    /// (The wire name is `loop`, a Rust keyword.)
    pub items: Vec<Value>,

    /// Behavioral toggles, defaulted where omitted.
    pub control: TemplateControl,
}

impl TableSpec {
    /// Validates a raw spec mapping into a [`TableSpec`].
    ///
    /// # Errors
    ///
    /// Returns an error if the raw value is not a mapping, if `columns`
    /// or `loop` is missing or mis-shaped, or if `template_control`
    /// carries an unknown or mistyped option. No partial result is ever
    /// produced.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let fields = raw.as_object().ok_or(TabrowError::NotAMapping)?;

        for name in fields.keys() {
            if !matches!(name.as_str(), "columns" | "loop" | "template_control") {
                return Err(TabrowError::UnknownField(name.clone()));
            }
        }

        let columns = fields
            .get("columns")
            .ok_or(TabrowError::MissingField("columns"))?
            .as_object()
            .ok_or(TabrowError::InvalidField {
                field: "columns",
                expected: "a mapping",
            })?
            .clone();

        let items = fields
            .get("loop")
            .ok_or(TabrowError::MissingField("loop"))?
            .as_array()
            .ok_or(TabrowError::InvalidField {
                field: "loop",
                expected: "a sequence",
            })?
            .clone();

        let control = match fields.get("template_control") {
            Some(value) => TemplateControl::from_value(value)?,
            None => TemplateControl::default(),
        };

        Ok(Self {
            columns,
            items,
            control,
        })
    }
}
