//! Disabled-signal classification of backend responses.
//!
//! DESIGN
//! ======
//! Pure function over an already-buffered body, so inspection never
//! consumes what the original caller will read. JSON bodies are judged by
//! their `error`/`message` fields only; unrelated fields that happen to say
//! "disabled" do not count. Non-JSON bodies fall back to a raw-text scan.

use reqwest::StatusCode;
use reqwest::Url;
use serde_json::Value;

pub const VERIFY_PATH: &str = "/api/auth/verify";

const DISABLED_MARKERS: [&str; 4] = ["disabled", "account has been", "account is disabled", "account disabled"];

/// What a response says about the account behind the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledSignal {
    /// The account is disabled or the session can no longer be verified.
    Disabled,
    /// A 4xx without a disabling message.
    UnauthorizedUnspecified,
    /// Nothing to act on.
    None,
}

/// Case-insensitive check for any of the disabled-account markers.
#[must_use]
pub fn is_disabled_message(text: &str) -> bool {
    let lower = text.to_lowercase();
    DISABLED_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Whether `url` targets the session verification endpoint.
#[must_use]
pub fn is_verify_endpoint(url: &Url) -> bool {
    url.path().trim_end_matches('/').ends_with(VERIFY_PATH)
}

/// How a buffered body reads when parsed for an error field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ErrorText {
    /// The body is not JSON at all.
    NotJson,
    /// JSON without a string `error`/`message` field.
    Absent,
    /// The `error` or `message` string, preferring whichever disables.
    Present(String),
}

pub(crate) fn error_text(body: &[u8]) -> ErrorText {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return ErrorText::NotJson;
    };
    let Value::Object(map) = value else {
        return ErrorText::Absent;
    };
    let fields: Vec<&str> = ["error", "message"]
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .collect();
    fields
        .iter()
        .find(|text| is_disabled_message(text))
        .or_else(|| fields.first())
        .map_or(ErrorText::Absent, |text| ErrorText::Present((*text).to_string()))
}

/// Whether a JSON body's `error` field carries a disabling message. The
/// `message` field is ignored: successful admin calls use it to describe
/// what happened to other accounts.
#[must_use]
pub fn has_disabling_error_field(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .is_ok_and(|value| value.get("error").and_then(Value::as_str).is_some_and(is_disabled_message))
}

/// Classify a response by status, originating URL and buffered body.
#[must_use]
pub fn classify(status: StatusCode, url: &Url, body: &[u8]) -> DisabledSignal {
    match error_text(body) {
        ErrorText::Present(text) if is_disabled_message(&text) => return DisabledSignal::Disabled,
        ErrorText::NotJson if is_disabled_message(&String::from_utf8_lossy(body)) => {
            return DisabledSignal::Disabled;
        }
        _ => {}
    }

    if status == StatusCode::UNAUTHORIZED && is_verify_endpoint(url) {
        return DisabledSignal::Disabled;
    }

    if status.is_client_error() {
        DisabledSignal::UnauthorizedUnspecified
    } else {
        DisabledSignal::None
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
