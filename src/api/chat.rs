//! Chat endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use serde_json::{Number, Value};

use super::AppState;
use crate::chat::ChatError;

/// Build chat router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .with_state(state)
}

/// Successful chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Answer one chat message
///
/// Accepts `{"message": ...}`. The body is parsed leniently so that a
/// missing field and a malformed body get the same client error.
async fn chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ChatApiError> {
    let message = parse_message(&body)?;
    tracing::debug!(chars = message.len(), "chat request");

    let reply = state.chat.handle(&message).await?;
    Ok(Json(ChatResponse { reply: reply.text }))
}

/// Pull the message text out of a request body
fn parse_message(body: &[u8]) -> Result<String, ChatApiError> {
    let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(body) else {
        return Err(ChatApiError::MissingMessage);
    };

    let value = fields
        .remove("message")
        .ok_or(ChatApiError::MissingMessage)?;

    message_text(value).ok_or(ChatApiError::Chat(ChatError::EmptyMessage))
}

/// Text of a message value; `None` for empty or falsy values
///
/// Non-string values are accepted in their JSON text form.
fn message_text(value: Value) -> Option<String> {
    let text = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::Number(n) if is_zero(&n) => return None,
        Value::Array(items) if items.is_empty() => return None,
        Value::Object(fields) if fields.is_empty() => return None,
        Value::String(s) => s,
        other => other.to_string(),
    };

    (!text.trim().is_empty()).then_some(text)
}

/// Exactly zero, in any numeric representation
#[allow(clippy::float_cmp)]
fn is_zero(n: &Number) -> bool {
    n.as_f64() == Some(0.0)
}

/// Chat API errors
#[derive(Debug)]
pub enum ChatApiError {
    MissingMessage,
    Chat(ChatError),
}

impl From<ChatError> for ChatApiError {
    fn from(err: ChatError) -> Self {
        Self::Chat(err)
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::MissingMessage => (StatusCode::BAD_REQUEST, "Missing 'message' field.".to_string()),
            Self::Chat(err @ ChatError::EmptyMessage) => (StatusCode::BAD_REQUEST, err.user_message()),
            Self::Chat(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.user_message()),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_string_message() {
        assert_eq!(parse_message(br#"{"message": "hi"}"#).unwrap(), "hi");
    }

    #[test]
    fn missing_or_malformed_body() {
        let bodies: [&[u8]; 5] = [b"{}", b"", b"not json", b"[1]", br#"{"msg": "hi"}"#];
        for body in bodies {
            assert!(matches!(
                parse_message(body),
                Err(ChatApiError::MissingMessage)
            ));
        }
    }

    #[test]
    fn falsy_values_are_empty() {
        for value in [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(-0.0),
            json!(""),
            json!("  "),
            json!([]),
            json!({}),
        ] {
            assert_eq!(message_text(value), None);
        }
    }

    #[test]
    fn other_values_are_stringified() {
        assert_eq!(message_text(json!(42)).as_deref(), Some("42"));
        assert_eq!(message_text(json!(1e-20)).as_deref(), Some("1e-20"));
        assert_eq!(message_text(json!(-0.5)).as_deref(), Some("-0.5"));
        assert_eq!(message_text(json!(true)).as_deref(), Some("true"));
        assert_eq!(message_text(json!(["a"])).as_deref(), Some(r#"["a"]"#));
    }

    #[test]
    fn error_statuses() {
        let status = |e: ChatApiError| e.into_response().status();
        assert_eq!(status(ChatApiError::MissingMessage), StatusCode::BAD_REQUEST);
        assert_eq!(status(ChatError::EmptyMessage.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(ChatError::ModelNotInitialized.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ChatError::Model { detail: "x".into() }.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
