pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Keys left out of the tabular formats. The raw wizard state is only
/// useful as JSON.
const TABULAR_SKIP: [&str; 1] = ["state"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into dotted field names, e.g. `fees.statutoryAudit`.
/// Arrays of scalars are joined; arrays of objects are kept as JSON.
pub(crate) fn flatten_fields(value: &Value) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    if let Value::Object(map) = value {
        for (key, val) in map {
            if TABULAR_SKIP.contains(&key.as_str()) {
                continue;
            }
            push_field(key.clone(), val, &mut rows);
        }
    }
    rows
}

fn push_field(name: String, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, val) in map {
                push_field(format!("{name}.{key}"), val, rows);
            }
        }
        _ => rows.push((name, scalar_text(value))),
    }
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) if arr.iter().all(|v| !v.is_object() && !v.is_array()) => {
            arr.iter().map(scalar_text).collect::<Vec<_>>().join(", ")
        }
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
