use crate::consts::{MIN_LINES_FOR_SHRINK_CHECK, MIN_RETAINED_LINE_RATIO};
use crate::exceptions::PatchError;

/// Turns an untrusted completion into replacement file text, or rejects it.
///
/// The checks, in order:
/// 1. a single Markdown fence wrapping the whole response is removed;
/// 2. empty or whitespace-only output is rejected;
/// 3. an error payload (a JSON object with a top-level `error` key) is
///    rejected unless the original file is itself shaped that way;
/// 4. unless `force` is set, a result keeping less than a quarter of a
///    sizeable original's lines is rejected as truncated.
///
/// A missing final newline is restored when the original had one.
pub fn validate_replacement(
    original: &str,
    candidate: &str,
    force: bool,
) -> Result<String, PatchError> {
    let mut text = strip_wrapping_fence(candidate).to_string();

    if text.trim().is_empty() {
        return Err(PatchError::RejectedResponse(
            "the model returned an empty file".into(),
        ));
    }

    if is_error_shaped(&text) && !is_error_shaped(original) {
        return Err(PatchError::RejectedResponse(format!(
            "the model returned an error payload: {}",
            text.trim()
        )));
    }

    let original_lines = original.lines().count();
    let candidate_lines = text.lines().count();
    if !force
        && original_lines >= MIN_LINES_FOR_SHRINK_CHECK
        && (candidate_lines as f64) < (original_lines as f64) * MIN_RETAINED_LINE_RATIO
    {
        return Err(PatchError::RejectedResponse(format!(
            "the response has {} lines where the original has {}; it looks truncated (use --force to accept it)",
            candidate_lines, original_lines
        )));
    }

    if original.ends_with('\n') && !text.ends_with('\n') {
        text.push('\n');
    }

    Ok(text)
}

/// Removes one Markdown code fence pair when it encloses the entire response.
fn strip_wrapping_fence(candidate: &str) -> &str {
    let trimmed = candidate.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return candidate;
    };
    // Opening fence line may carry a language tag
    let Some((_, body)) = rest.split_once('\n') else {
        return candidate;
    };
    let Some(inner) = body.strip_suffix("```") else {
        return candidate;
    };
    if inner.contains("\n```") {
        // More than one fenced block; not a simple wrapper
        return candidate;
    }
    inner
}

fn is_error_shaped(text: &str) -> bool {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return false;
    }
    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|v| v.as_object().map(|o| o.contains_key("error")))
        .unwrap_or(false)
}
