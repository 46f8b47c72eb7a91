// Streaming and strict extraction of the card envelope.
//
// The live path runs on every throttled update against the accumulated text
// and must tolerate arbitrarily truncated JSON; the strict path runs once at
// stream end.

use tracing::debug;

use crate::envelope::types::{Envelope, ResponseMode};

const CONTENT_KEY: &str = "\"content\"";

/// Decide the response mode from the accumulated text.
///
/// Returns `None` while only whitespace has arrived; once a decision is
/// returned it is final for the turn (the caller stores it and never asks
/// again).
pub fn detect_mode(accumulated: &str) -> Option<ResponseMode> {
    let first = accumulated.chars().find(|c| !c.is_whitespace())?;
    if first == '{' {
        Some(ResponseMode::JsonEnvelope)
    } else {
        Some(ResponseMode::PlainText)
    }
}

/// Extract the partial value of the `content` field from a JSON object that
/// is still arriving, for live display before the object closes.
pub fn extract_live_content(accumulated: &str) -> Option<String> {
    let key_pos = accumulated.find(CONTENT_KEY)?;
    let rest = accumulated[key_pos + CONTENT_KEY.len()..].trim_start();
    let rest = rest.strip_prefix(':')?.trim_start();
    let body = rest.strip_prefix('"')?;

    let mut raw = String::new();
    let mut escaped = false;
    for ch in body.chars() {
        if escaped {
            raw.push('\\');
            raw.push(ch);
            escaped = false;
        } else if ch == '\\' {
            // Held back until its continuation arrives; a trailing lone
            // backslash is dropped rather than surfaced.
            escaped = true;
        } else if ch == '"' {
            break;
        } else {
            raw.push(ch);
        }
    }

    drop_incomplete_unicode_escape(&mut raw);
    Some(unescape(&raw))
}

/// Parse the complete accumulated text as an envelope.
///
/// Returns `None` both when the text is not an envelope at all (no `content`
/// key; the caller falls back to plain display) and when the JSON is
/// malformed. The two cases carry different log lines but the same recovery.
pub fn parse_envelope(full_text: &str) -> Option<Envelope> {
    let trimmed = full_text.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(err) => {
            debug!("envelope finalization parse failed: {}", err);
            return None;
        }
    };

    let object = value.as_object()?;
    if !object.contains_key("content") {
        debug!("object without content key, treating as plain text");
        return None;
    }

    let mut envelope: Envelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!("envelope shape mismatch: {}", err);
            return None;
        }
    };

    if envelope.list.as_ref().is_some_and(|list| list.is_empty()) {
        envelope.list = None;
    }
    Some(envelope)
}

/// Strip a trailing `\uXXXX` escape that was cut off mid-digits.
fn drop_incomplete_unicode_escape(raw: &mut String) {
    if let Some(pos) = raw.rfind("\\u") {
        let tail = &raw[pos + 2..];
        if tail.len() < 4 && tail.chars().all(|c| c.is_ascii_hexdigit()) {
            raw.truncate(pos);
        }
    }
}

/// Unescape a JSON string body. Prefers the strict JSON rules; if those
/// fail on a truncated tail, falls back to a manual pass over the common
/// sequences so raw escape codes never reach the display.
fn unescape(raw: &str) -> String {
    if let Ok(value) = serde_json::from_str::<String>(&format!("\"{}\"", raw)) {
        return value;
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => {}
        }
    }
    out
}
