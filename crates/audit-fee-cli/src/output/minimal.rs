use serde_json::Value;

use super::scalar_text;

/// Fields that carry the headline answer, most specific first.
const PRIORITY_KEYS: [&str; 10] = [
    "proposed_total",
    "recommended_total",
    "path",
    "total",
    "proposed_fee",
    "cagr",
    "converted",
    "formatted",
    "step",
    "clientName",
];

/// Print just the key answer value from the output.
///
/// Looks through the `result` envelope when there is one, then falls back
/// to the first field. Lists print one headline per entry.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Array(items) => {
            for item in items {
                println!("{}", headline(item));
            }
        }
        other => println!("{}", headline(other)),
    }
}

fn headline(value: &Value) -> String {
    let Value::Object(map) = value else {
        return scalar_text(value);
    };
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key) {
            if !val.is_null() {
                return scalar_text(val);
            }
        }
    }
    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, scalar_text(val)),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_picks_total_from_envelope() {
        let value = json!({"result": {"fees": {}, "total": "110000"}, "warnings": []});
        let result = value.get("result").unwrap();
        assert_eq!(headline(result), "110000");
    }

    #[test]
    fn test_summary_prefers_rupee_total() {
        let value = json!({"step": "Step 5 of 5: Summary", "proposed_total": "₹1,10,000.00"});
        assert_eq!(headline(&value), "₹1,10,000.00");
    }

    #[test]
    fn test_null_priority_value_is_skipped() {
        let value = json!({"proposed_fee": null, "cagr": "0.1"});
        assert_eq!(headline(&value), "0.1");
    }

    #[test]
    fn test_directory_entries_use_client_name() {
        let value = json!({"id": 1, "clientName": "ABC Manufacturing Ltd."});
        assert_eq!(headline(&value), "ABC Manufacturing Ltd.");
    }
}
