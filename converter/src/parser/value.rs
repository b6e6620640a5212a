//! Cell access and value rendering.
//!
//! Loaded cells are normalized so that a missing value is always
//! `Value::Null`: blank strings, spreadsheet error cells and non-finite
//! floats never survive loading. Everything downstream only asks "present or
//! not" and "render as text".

use serde_json::{Map, Number, Value};

/// One input row: column name to cell.
pub type Row = Map<String, Value>;

/// Largest magnitude at which an integral float is still printed as an integer.
const INTEGRAL_LIMIT: f64 = 1e15;

/// Normalize a raw string cell: trimmed, blank becomes missing.
pub fn string_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

/// Normalize a float cell: non-finite becomes missing.
pub fn float_cell(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// Get a present (non-null) cell.
pub fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|v| !v.is_null())
}

/// Render a present cell as text.
pub fn text(row: &Row, column: &str) -> Option<String> {
    cell(row, column).and_then(render)
}

/// Render a cell value as text, `None` for missing.
pub fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(render_number(n)),
        other => Some(other.to_string()),
    }
}

/// Render a JSON number with the fixed numeric rule.
pub fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    n.as_f64().map(render_float).unwrap_or_else(|| n.to_string())
}

/// Integral floats print without a fractional part, everything else with the
/// shortest text that round-trips.
pub fn render_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < INTEGRAL_LIMIT {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Coerce a cell to an integer.
///
/// Accepts integers, integral finite floats and their textual forms.
/// Fractional, non-finite and non-numeric values are rejected.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < INTEGRAL_LIMIT).then_some(value as i64)
}
