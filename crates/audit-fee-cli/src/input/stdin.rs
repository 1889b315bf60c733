use serde_json::Value;
use std::io::{self, Read};

/// Read piped input as JSON, falling back to YAML.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => match serde_yaml::from_str::<Value>(trimmed) {
            // a bare scalar is a JSON typo, not a YAML document
            Ok(value) if value.is_object() || value.is_array() => Ok(Some(value)),
            _ => Err(format!("stdin is neither JSON nor YAML: {json_err}").into()),
        },
    }
}
