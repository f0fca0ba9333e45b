//! Decoding and rendering of tool-call arguments.

use super::ToolError;
use crate::model::ToolSpec;
use serde_json::{Map, Value};

/// Decode raw tool-call input into an argument object.
///
/// Providers deliver either a JSON object or the object encoded as a JSON
/// string. An empty string or `null` is treated as no arguments.
pub fn decode_arguments(tool: &str, input: &Value) -> Result<Map<String, Value>, ToolError> {
    let invalid = |reason: String| ToolError::InvalidInput {
        tool: tool.to_string(),
        reason,
    };

    let decoded = match input {
        Value::String(raw) if raw.trim().is_empty() => return Ok(Map::new()),
        Value::String(raw) => serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?,
        other => other.clone(),
    };

    match decoded {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(invalid(format!("expected an object, got {other}"))),
    }
}

/// Check that every property the schema marks as required is present.
pub fn check_required(spec: &ToolSpec, arguments: &Map<String, Value>) -> Result<(), ToolError> {
    let Some(required) = spec.schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };

    let missing: Vec<&str> = required
        .iter()
        .filter_map(Value::as_str)
        .filter(|key| !arguments.contains_key(*key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToolError::InvalidInput {
            tool: spec.name.clone(),
            reason: format!("missing required arguments: {}", missing.join(", ")),
        })
    }
}

/// Render arguments in the compact form used by the call trace,
/// e.g. `{'query': 'rust', 'limit': 5}`.
pub fn render_arguments(arguments: &Map<String, Value>) -> String {
    let mut out = String::new();
    render_object(arguments, &mut out);
    out
}

fn render_object(map: &Map<String, Value>, out: &mut String) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_str(key, out);
        out.push_str(": ");
        render_value(value, out);
    }
    out.push('}');
}

fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => render_str(s, out),
        Value::Object(map) => render_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_value(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn render_str(s: &str, out: &mut String) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('\'');
}
