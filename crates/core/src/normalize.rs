//! Canonical mapping from backend payloads to the session and chat models.
//!
//! Every consumer of `/api/analyze` and `/api/ask` responses (the HTTP gateway,
//! the persisted-state loader) goes through these functions. The backend has
//! shipped several response shapes over time:
//!
//! - analysis fields at the top level, nested under `analysis`, or split
//!   between the two (`video_id` top level, the rest nested);
//! - answers as `{type, answer}`, `{type: "beyond", transcript_answer,
//!   general_answer}`, or either of those wrapped in `{data: ...}`.

use serde_json::Value;

use crate::types::{ChatMessage, Mode, Session};

pub const NO_TRANSCRIPT_ANSWER: &str = "No transcript-based answer.";
pub const NO_GENERAL_ANSWER: &str = "No general knowledge answer.";
pub const NO_ANSWER: &str = "No answer available.";

/// Look a field up at the top level first, then under `analysis`.
///
/// `null` and empty strings count as absent so that a blank top-level value
/// does not shadow a populated nested one.
fn analysis_field<'a>(payload: &'a Value, name: &str) -> Option<&'a Value> {
    let present = |v: &&Value| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    };

    payload
        .get(name)
        .filter(present)
        .or_else(|| payload.get("analysis").and_then(|a| a.get(name)).filter(present))
}

fn text_field(payload: &Value, name: &str) -> String {
    analysis_field(payload, name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn list_field(payload: &Value, name: &str) -> Vec<String> {
    match analysis_field(payload, name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Map an analyze payload into a [`Session`].
///
/// `video_id` may come back empty; callers decide how to fill it.
pub fn session_from_payload(payload: &Value) -> Session {
    Session {
        video_id: text_field(payload, "video_id").trim().to_string(),
        transcript: text_field(payload, "transcript"),
        summary: text_field(payload, "summary"),
        key_points: list_field(payload, "key_points"),
        language: Some(text_field(payload, "language")).filter(|l| !l.is_empty()),
    }
}

fn unwrap_data(payload: &Value) -> &Value {
    match payload.get("data") {
        Some(inner @ Value::Object(_)) if payload.get("type").is_none() => inner,
        _ => payload,
    }
}

fn answer_text<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Map an ask payload into one or two assistant fragments.
///
/// `type == "beyond"` yields `[transcript (default), general (beyond)]` in that
/// order; anything else yields a single fragment tagged with `type`, or
/// `default` when `type` is absent or unrecognized.
pub fn answer_fragments(payload: &Value) -> Vec<ChatMessage> {
    let res = unwrap_data(payload);
    let kind = res.get("type").and_then(Value::as_str);

    if kind == Some(Mode::Beyond.as_str()) {
        return vec![
            ChatMessage::assistant(
                answer_text(res, "transcript_answer").unwrap_or(NO_TRANSCRIPT_ANSWER),
                Mode::Default,
            ),
            ChatMessage::assistant(
                answer_text(res, "general_answer").unwrap_or(NO_GENERAL_ANSWER),
                Mode::Beyond,
            ),
        ];
    }

    let text = answer_text(res, "answer")
        .or_else(|| answer_text(res, "general_answer"))
        .unwrap_or(NO_ANSWER);
    let mode = kind.and_then(Mode::from_wire).unwrap_or_default();

    vec![ChatMessage::assistant(text, mode)]
}

/// Extract a human-readable failure reason from an error response body.
pub fn error_reason(body: &str, status_text: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .filter(|d| !d.is_null());

    match detail {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::String(_)) | None => status_text.to_string(),
        Some(other) => other.to_string(),
    }
}
