//! Lenient extraction of JSON objects from model output.
//!
//! Models wrap JSON in markdown fences or surround it with prose. We strip
//! fences and take the outermost `{ ... }` span.

use crate::error::LlmError;
use serde_json::Value as JsonValue;

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Extracts the first JSON object from `text`.
///
/// # Errors
///
/// Returns [`LlmError::ResponseParseFailed`] if no object can be found or
/// the candidate span is not valid JSON.
pub fn extract_json_object(text: &str) -> Result<JsonValue, LlmError> {
    let body = strip_fences(text);

    let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) else {
        return Err(LlmError::ResponseParseFailed {
            reason: "no JSON object in model output".to_string(),
        });
    };
    if end < start {
        return Err(LlmError::ResponseParseFailed {
            reason: "no JSON object in model output".to_string(),
        });
    }

    let value: JsonValue =
        serde_json::from_str(&body[start..=end]).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;
    if !value.is_object() {
        return Err(LlmError::ResponseParseFailed {
            reason: "model output is not a JSON object".to_string(),
        });
    }
    Ok(value)
}
