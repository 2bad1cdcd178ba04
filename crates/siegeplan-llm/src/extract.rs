// Parsing of generated strategy text.
//
// The generative service returns JSON either bare or wrapped in a markdown
// code fence. All unwrapping happens here.

use siegeplan_core::strategy::Strategy;

use crate::client::GenerateError;

const FENCE: &str = "```";

/// Return the JSON body of `text`, removing a surrounding code fence (with
/// or without an info string such as `json`) if there is one.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    let Some(start) = trimmed.find(FENCE) else {
        return trimmed;
    };
    let after_open = &trimmed[start + FENCE.len()..];

    // Skip the info string only; the body may start on the fence line.
    let body = after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric());

    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

/// Parse generated text into a [`Strategy`].
pub fn parse_strategy(text: &str) -> Result<Strategy, GenerateError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(GenerateError::InvalidResponse("empty response".into()));
    }
    serde_json::from_str(body).map_err(|e| GenerateError::InvalidResponse(e.to_string()))
}
