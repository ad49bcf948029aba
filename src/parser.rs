//! Response Parser
//!
//! Turns raw model output into typed values. The only tolerance for
//! formatting noise is [`extract_json_block`]: a ```` ```json ```` fence is
//! stripped, everything else goes straight to strict serde validation.

use serde::de::DeserializeOwned;

const JSON_FENCE: &str = "```json";
const CLOSING_FENCE: &str = "```";

/// Model output that did not match the expected schema.
///
/// Always carries the raw text so callers can show it to the user.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to parse model output: {message}")]
pub struct ParseError {
    message: String,
    raw: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// The unmodified model output
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Pull the JSON payload out of a fenced block, if there is one.
///
/// Takes the text between the first ```` ```json ```` marker and the next
/// closing fence (or the end of input when the fence is never closed).
/// Without a marker the whole text is returned, trimmed.
pub fn extract_json_block(raw: &str) -> &str {
    match raw.find(JSON_FENCE) {
        Some(start) => {
            let rest = &raw[start + JSON_FENCE.len()..];
            let end = rest.find(CLOSING_FENCE).unwrap_or(rest.len());
            rest[..end].trim()
        }
        None => raw.trim(),
    }
}

/// Strictly deserialize model output into `T`.
///
/// Missing or mistyped fields fail; unknown extra fields are ignored.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let payload = extract_json_block(raw);
    if payload.is_empty() {
        return Err(ParseError::new("model returned no content", raw));
    }

    serde_json::from_str(payload).map_err(|e| ParseError::new(e.to_string(), raw))
}
