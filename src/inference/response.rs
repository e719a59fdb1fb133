//! Cleanup of free-form model output into JSON

use serde::de::DeserializeOwned;

use crate::inference::error::InferenceError;

/// Remove a surrounding Markdown code fence, with or without a language tag
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Slice from the first `open` to the last `close`, inclusive
fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a JSON value out of model text
///
/// Tries the fence-stripped text first, then the outermost `{...}` or
/// `[...]` slice, which recovers answers wrapped in prose.
pub fn parse_model_json<T: DeserializeOwned>(text: &str, array: bool) -> Result<T, InferenceError> {
    let cleaned = strip_code_fences(text);

    let first_error = match serde_json::from_str(cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let (open, close) = if array { ('[', ']') } else { ('{', '}') };
    outermost(cleaned, open, close)
        .ok_or_else(|| InferenceError::Parse(first_error.to_string()))
        .and_then(|slice| {
            serde_json::from_str(slice).map_err(|e| InferenceError::Parse(e.to_string()))
        })
}
