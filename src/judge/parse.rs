use serde_json::Value;

use super::error::JudgeError;

/// Parses a model reply that should be a single JSON object.
///
/// Markdown code fences are dropped first. If the text still does not parse,
/// the outermost `{ ... }` span is tried before giving up.
pub fn parse_json_response(raw: &str) -> Result<Value, JudgeError> {
    let cleaned = strip_code_fences(raw);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => value,
        Err(first_err) => match (cleaned.find('{'), cleaned.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&cleaned[start..=end])?,
            _ => return Err(first_err.into()),
        },
    };

    if !value.is_object() {
        return Err(JudgeError::MalformedResponse {
            reason: format!("expected a JSON object, got {}", kind(&value)),
        });
    }
    Ok(value)
}

pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
