//! Cell formatting for tabular export.
//!
//! Columns without a registered formatter fall back to [`default_format`]:
//! scalars become their string form and nested objects or arrays become
//! compact JSON text.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot format cell: {0}")]
pub struct FormatError(pub String);

/// Turns one non-null cell value into text.
pub type CellFormatter = Arc<dyn Fn(&Value) -> Result<String, FormatError> + Send + Sync>;

/// Maps column name to the formatter used for that column.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    by_column: HashMap<String, CellFormatter>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, column: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&Value) -> Result<String, FormatError> + Send + Sync + 'static,
    {
        self.by_column.insert(column.into(), Arc::new(formatter));
        self
    }

    /// Formats a cell. Null, absent and unformattable values become an
    /// empty string; a failure never affects other cells.
    pub fn format(&self, column: &str, value: Option<&Value>) -> String {
        let value = match value {
            None | Some(Value::Null) => return String::new(),
            Some(v) => v,
        };
        let formatted = match self.by_column.get(column) {
            Some(formatter) => formatter(value),
            None => default_format(value),
        };
        formatted.unwrap_or_else(|err| {
            tracing::warn!(column, error = %err, "export cell degraded to empty");
            String::new()
        })
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut columns: Vec<&String> = self.by_column.keys().collect();
        columns.sort();
        f.debug_struct("FormatterRegistry").field("columns", &columns).finish()
    }
}

pub fn default_format(value: &Value) -> Result<String, FormatError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(number_text(n)),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).map_err(|e| FormatError(e.to_string())),
    }
}

/// Number text as a JavaScript runtime would print it: `3.0` is `3`,
/// `1e21` is `1e+21` and `1e-7` is `1e-7`.
fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(float_text).unwrap_or_else(|| n.to_string())
    }
}

fn float_text(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return f.to_string();
    }
    let exp = format!("{f:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

/// Renders booleans as `Yes` / `No`.
pub fn yes_no(value: &Value) -> Result<String, FormatError> {
    match value {
        Value::Bool(true) => Ok("Yes".to_string()),
        Value::Bool(false) => Ok("No".to_string()),
        other => Err(FormatError(format!("expected a boolean, got {other}"))),
    }
}

/// Keeps the calendar-day part of an RFC 3339 timestamp.
pub fn date_only(value: &Value) -> Result<String, FormatError> {
    let raw = value.as_str().ok_or_else(|| FormatError(format!("expected a timestamp, got {value}")))?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive().format("%Y-%m-%d").to_string())
        .map_err(|e| FormatError(e.to_string()))
}

/// Joins the scalar items of an array with `separator`.
pub fn joined(separator: &'static str) -> impl Fn(&Value) -> Result<String, FormatError> + Send + Sync + 'static {
    move |value: &Value| match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) => Err(FormatError("nested value in joined column".to_string())),
                scalar => default_format(scalar),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join(separator)),
        scalar => default_format(scalar),
    }
}
