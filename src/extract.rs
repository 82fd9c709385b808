//! Reply text extraction
//!
//! Gemini replies arrive in several shapes depending on API version and on
//! whether the body went through a typed client or was handed over as raw
//! JSON. [`ModelReply`] closes that set of shapes into tagged variants and
//! [`extract_text`] applies one rule per variant:
//!
//! ```text
//! PlainText      "hello"                                      -> "hello"
//! CandidateList  {text: "..."} / {candidates: [{content}]}    -> first candidate
//! Mapping        any other object, probed by key lookup      -> first candidate
//! Unknown        numbers, arrays, null                        -> no text
//! ```
//!
//! Only the first candidate and the first content element are ever looked at.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Returned when a reply has no text and no usable string form
pub const EXTRACTION_PLACEHOLDER: &str = "(unable to extract text)";

/// Opaque reply from a language model call
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// The reply is already a string
    PlainText(String),
    /// Typed `generateContent`-style response, with the object it came from
    CandidateList {
        list: CandidateList,
        raw: Map<String, Value>,
    },
    /// Object that did not fit the typed shape
    Mapping(Map<String, Value>),
    /// Anything else
    Unknown(Value),
}

/// Typed response: an optional direct text field plus candidates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(
        default,
        alias = "outputText",
        skip_serializing_if = "Option::is_none"
    )]
    pub output_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

/// Candidate content
///
/// Older SDKs expose a bare sequence of parts, the REST API wraps them as
/// `{"parts": [...], "role": "model"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Sequence(Vec<Part>),
    Parts { parts: Vec<Part> },
    Other(Value),
}

/// A single content element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    Plain(String),
    Other(Value),
}

impl Content {
    fn first_part(&self) -> Option<&Part> {
        match self {
            Self::Sequence(parts) | Self::Parts { parts } => parts.first(),
            Self::Other(_) => None,
        }
    }
}

impl Part {
    fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text } | Self::Plain(text) => Some(text),
            Self::Other(_) => None,
        }
    }
}

impl From<Value> for ModelReply {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::PlainText(text),
            Value::Object(map) => Self::from_object(map),
            other => Self::Unknown(other),
        }
    }
}

impl From<String> for ModelReply {
    fn from(text: String) -> Self {
        Self::PlainText(text)
    }
}

impl From<&str> for ModelReply {
    fn from(text: &str) -> Self {
        Self::PlainText(text.to_string())
    }
}

impl ModelReply {
    fn from_object(map: Map<String, Value>) -> Self {
        if (map.contains_key("text") || map.contains_key("candidates"))
            && let Ok(list) = CandidateList::deserialize(&Value::Object(map.clone()))
        {
            return Self::CandidateList { list, raw: map };
        }
        Self::Mapping(map)
    }

    /// Short variant name for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PlainText(_) => "plain_text",
            Self::CandidateList { .. } => "candidate_list",
            Self::Mapping(_) => "mapping",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// No text field could be located in a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no text found in model reply")]
    NoText,
}

/// Locate the reply text
///
/// # Errors
///
/// Returns [`ExtractError::NoText`] if none of the known shapes carries text
pub fn extract_text(reply: &ModelReply) -> Result<String, ExtractError> {
    let found = match reply {
        ModelReply::PlainText(text) => Some(text.clone()),
        ModelReply::CandidateList { list, .. } => from_candidate_list(list),
        ModelReply::Mapping(map) => from_mapping(map),
        ModelReply::Unknown(_) => None,
    };

    found.ok_or(ExtractError::NoText)
}

/// Locate the reply text, degrading to the reply's string form
///
/// Never fails: when no text is found the serialized reply is returned, and
/// when there is nothing to serialize, [`EXTRACTION_PLACEHOLDER`].
#[must_use]
pub fn reply_text(reply: &ModelReply) -> String {
    extract_text(reply).unwrap_or_else(|ExtractError::NoText| {
        tracing::debug!(kind = reply.kind(), "no text in model reply, using string form");
        fallback(reply)
    })
}

fn from_candidate_list(list: &CandidateList) -> Option<String> {
    if let Some(text) = list.text.as_deref().filter(|t| !t.is_empty()) {
        return Some(text.to_string());
    }

    let first = list.candidates.first()?;
    if let Some(output) = &first.output_text {
        return Some(output.clone());
    }

    first
        .content
        .as_ref()?
        .first_part()?
        .text()
        .map(ToString::to_string)
}

fn from_mapping(map: &Map<String, Value>) -> Option<String> {
    if let Some(text) = map.get("text").and_then(Value::as_str).filter(|t| !t.is_empty()) {
        return Some(text.to_string());
    }

    let candidate = map.get("candidates")?.as_array()?.first()?.as_object()?;
    if let Some(output) = candidate
        .get("output_text")
        .or_else(|| candidate.get("outputText"))
    {
        return output.as_str().map(ToString::to_string);
    }

    let elements = match candidate.get("content")? {
        Value::Array(items) => items,
        Value::Object(content) => content.get("parts")?.as_array()?,
        _ => return None,
    };

    match elements.first()? {
        Value::String(text) => Some(text.clone()),
        Value::Object(part) => part.get("text")?.as_str().map(ToString::to_string),
        _ => None,
    }
}

fn fallback(reply: &ModelReply) -> String {
    let repr = match reply {
        ModelReply::PlainText(text) => Some(text.clone()),
        ModelReply::CandidateList { raw: map, .. } | ModelReply::Mapping(map) => {
            serde_json::to_string(map).ok()
        }
        ModelReply::Unknown(Value::Null) => None,
        ModelReply::Unknown(value) => Some(value.to_string()),
    };

    repr.unwrap_or_else(|| EXTRACTION_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn extract(value: Value) -> String {
        reply_text(&ModelReply::from(value))
    }

    #[test]
    fn plain_strings_are_returned_unchanged() {
        for s in ["hello", "", "  padded  ", "multi\nline"] {
            assert_eq!(reply_text(&ModelReply::from(s)), s);
            assert_eq!(extract(json!(s)), s);
        }
    }

    #[test]
    fn direct_text_field_wins_over_candidates() {
        let value = json!({
            "text": "direct",
            "candidates": [{"output_text": "from candidate"}]
        });
        assert_eq!(extract(value), "direct");
    }

    #[test]
    fn empty_text_field_falls_through_to_candidates() {
        let value = json!({
            "text": "",
            "candidates": [{"content": [{"text": "nested"}]}]
        });
        assert_eq!(extract(value), "nested");
    }

    #[test]
    fn candidate_content_sequence() {
        let value = json!({"candidates": [{"content": [{"text": "X"}]}]});
        assert!(matches!(ModelReply::from(value.clone()), ModelReply::CandidateList { .. }));
        assert_eq!(extract(value), "X");
    }

    #[test]
    fn candidate_content_bare_string() {
        let value = json!({"candidates": [{"content": ["just text", "ignored"]}]});
        assert_eq!(extract(value), "just text");
    }

    #[test]
    fn rest_api_parts_shape() {
        let value = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hi there"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3}
        });
        assert_eq!(extract(value), "Hi there");
    }

    #[test]
    fn only_first_candidate_is_used() {
        let value = json!({
            "candidates": [{"output_text": "Y"}, {"output_text": "Z"}]
        });
        assert_eq!(extract(value), "Y");

        let value = json!({
            "candidates": [{"content": []}, {"content": [{"text": "later"}]}]
        });
        assert_eq!(extract_text(&ModelReply::from(value)), Err(ExtractError::NoText));
    }

    #[test]
    fn output_text_is_returned_even_when_empty() {
        let value = json!({"candidates": [{"output_text": "", "content": [{"text": "X"}]}]});
        assert_eq!(extract(value), "");
    }

    #[test]
    fn mapping_shape_uses_key_lookups() {
        // `output_text` is not a string, so the typed shape is rejected
        let value = json!({"candidates": [{"output_text": 7, "content": [{"text": "X"}]}]});
        let reply = ModelReply::from(value);
        assert!(matches!(reply, ModelReply::Mapping(_)));
        assert_eq!(extract_text(&reply), Err(ExtractError::NoText));

        let mut map = Map::new();
        map.insert("candidates".into(), json!([{"content": [{"text": "X"}]}]));
        assert_eq!(reply_text(&ModelReply::Mapping(map)), "X");

        let mut map = Map::new();
        map.insert("candidates".into(), json!([{"output_text": "Y"}, {"output_text": "Z"}]));
        assert_eq!(reply_text(&ModelReply::Mapping(map)), "Y");
    }

    #[test]
    fn mapping_with_loose_content_types() {
        let value = json!({"candidates": [{"content": [{"text": 42}]}]});
        let reply = ModelReply::from(value);
        assert!(matches!(reply, ModelReply::CandidateList { .. }));
        assert!(extract_text(&reply).is_err());

        let value = json!({"candidates": [{"content": {"role": "model"}}]});
        assert!(extract_text(&ModelReply::from(value)).is_err());
    }

    #[test]
    fn unrecognized_shapes_fall_back_to_string_form() {
        assert_eq!(extract(json!({})), "{}");
        assert_eq!(extract(json!({"foo": "bar"})), r#"{"foo":"bar"}"#);
        assert_eq!(extract(json!(42)), "42");
        assert_eq!(extract(json!([1, 2])), "[1,2]");
        assert_eq!(extract(json!({"candidates": []})), r#"{"candidates":[]}"#);
    }

    #[test]
    fn blocked_reply_falls_back_to_the_whole_object() {
        let value = json!({
            "candidates": [{"finishReason": "SAFETY", "index": 0}],
            "promptFeedback": {"blockReason": "SAFETY"}
        });
        let reply = ModelReply::from(value.clone());
        assert!(matches!(reply, ModelReply::CandidateList { .. }));
        assert_eq!(extract_text(&reply), Err(ExtractError::NoText));
        assert_eq!(reply_text(&reply), value.to_string());
    }

    #[test]
    fn null_reply_uses_placeholder() {
        assert_eq!(extract(Value::Null), EXTRACTION_PLACEHOLDER);
    }

    #[test]
    fn classification() {
        assert_eq!(ModelReply::from(json!("a")).kind(), "plain_text");
        assert_eq!(ModelReply::from(json!({"text": "a"})).kind(), "candidate_list");
        assert_eq!(ModelReply::from(json!({"other": 1})).kind(), "mapping");
        assert_eq!(ModelReply::from(json!(true)).kind(), "unknown");
    }
}
