//! Parse completion text into a JSON record

use crate::error::ShapeError;
use serde_json::{Map, Value};

/// Parse completion text into a JSON object
///
/// The engine is prompted to answer with bare JSON, but a surrounding
/// markdown code fence is tolerated.
pub fn parse_completion(raw: &str) -> Result<Map<String, Value>, ShapeError> {
    let json_str = extract_json(raw);

    let value: Value =
        serde_json::from_str(json_str).map_err(|e| ShapeError::NotJson(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ShapeError::NotAnObject),
    }
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    let Some(fenced) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string (```json) up to the first newline
    let body = match fenced.find('\n') {
        Some(pos) => &fenced[pos + 1..],
        None => return "",
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
