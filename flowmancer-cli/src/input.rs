//! JSON arguments
//!
//! Arguments that take JSON accept either an inline document or `@path`
//! to read it from a file.

use anyhow::{Context, Result, bail};
use serde_json::Value;

/// Parses an inline JSON document or the contents of `@path`
pub fn read_json(arg: &str) -> Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON file: {}", path))?,
        None => arg.to_string(),
    };

    serde_json::from_str(&text).context("Argument is not valid JSON")
}

/// Batch inputs must be a JSON array
pub fn read_json_array(arg: &str) -> Result<Vec<Value>> {
    match read_json(arg)? {
        Value::Array(items) => Ok(items),
        other => bail!("Expected a JSON array of inputs, got {}", kind_of(&other)),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
