use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use audit_fee_core::engagement::ServiceKey;
use audit_fee_core::format::format_inr;

use super::{flatten_fields, scalar_text};

/// Fee maps keyed by service, rendered as their own rupee table.
const FEE_MAPS: [&str; 4] = ["fees", "multiplier_fees", "cagr_fees", "proposed_fees"];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", scalar_text(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut scalars = Map::new();
    let mut fee_tables = Vec::new();
    let mut lines = None;
    for (key, val) in map {
        match val {
            Value::Object(fees) if FEE_MAPS.contains(&key.as_str()) => {
                fee_tables.push((key.as_str(), fees))
            }
            Value::Array(items) if key == "lines" => lines = Some(items),
            _ => {
                scalars.insert(key.clone(), val.clone());
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (field, text) in flatten_fields(&Value::Object(scalars)) {
        builder.push_record([field, text]);
    }
    println!("{}", Table::from(builder));

    for (name, fees) in fee_tables {
        println!("\n{}:", name);
        println!("{}", fee_table(fees));
    }
    if let Some(items) = lines {
        println!("\nlines:");
        print_array_table(items);
    }
}

fn fee_table(fees: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Service", "Fee"]);
    for (key, val) in fees {
        let service = key
            .parse::<ServiceKey>()
            .map(|k| k.label().to_string())
            .unwrap_or_else(|_| key.clone());
        builder.push_record([service, rupees(val)]);
    }
    Table::from(builder)
}

/// Decimal strings become rupee amounts; anything else (already formatted
/// text) is shown unchanged.
fn rupees(value: &Value) -> String {
    match value {
        Value::String(s) => s
            .parse::<Decimal>()
            .map(|d| format_inr(d, true))
            .unwrap_or_else(|_| s.clone()),
        other => scalar_text(other),
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", scalar_text(item));
        }
    }
}
