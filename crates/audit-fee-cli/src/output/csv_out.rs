use serde_json::Value;
use std::io;

use super::{flatten_fields, scalar_text};

/// Write output as CSV to stdout.
///
/// Objects become `field,value` rows with nested fee maps flattened to
/// dotted names; lists of directory records or fee lines become one row each.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match body {
        Value::Object(_) => {
            let _ = wtr.write_record(["field", "value"]);
            for (field, text) in flatten_fields(body) {
                let _ = wtr.write_record([field, text]);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([scalar_text(body)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([scalar_text(item)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_directory_rows_share_headers() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let people = json!([
            {"id": 101, "name": "Rajiv Sharma"},
            {"id": 201, "name": "Rahul Gupta"}
        ]);
        write_array_csv(&mut wtr, people.as_array().unwrap());
        let bytes = wtr.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "id,name\n101,Rajiv Sharma\n201,Rahul Gupta\n");
    }
}
