use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::ArchiveError;

fn payload_re() -> &'static Regex {
    static PAYLOAD_RE: OnceLock<Regex> = OnceLock::new();
    PAYLOAD_RE.get_or_init(|| {
        // Object form is listed first so it wins when both could start at the same offset.
        Regex::new(r"(?s)(\{.*\}|\[.*\])").expect("valid payload regex")
    })
}

/// Locate the first `{...}` / `[...]` region in free-form text.
///
/// The match is greedy: it runs from the first opening brace to the last
/// closing one, across newlines.
pub fn find_fragment(text: &str) -> Option<&str> {
    payload_re().find(text).map(|m| m.as_str())
}

/// Replace curly double quotes pasted from chat clients with ASCII quotes.
pub fn normalize_quotes(fragment: &str) -> String {
    fragment.replace(['\u{201C}', '\u{201D}'], "\"")
}

/// Pull the embedded JSON payload out of a chat message.
pub fn extract(text: &str) -> Result<Value, ArchiveError> {
    let fragment = find_fragment(text.trim()).ok_or(ArchiveError::NoPayload)?;
    let cleaned = normalize_quotes(fragment);
    serde_json::from_str(&cleaned).map_err(|e| ArchiveError::from_json(&e))
}
