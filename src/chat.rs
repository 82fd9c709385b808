//! Chat request handling
//!
//! Shared by both front-ends: validates one message, answers it with a mock
//! echo or a single model call, and reduces every failure to a [`ChatError`].

use std::sync::Arc;

use crate::config::Config;
use crate::extract;
use crate::llm::LanguageModel;

/// Prefix marking mock replies
pub const MOCK_PREFIX: &str = "(mock) I received: ";

/// Text spoken by the voice loop when a request fails
pub const SPOKEN_APOLOGY: &str = "Sorry, I encountered an error processing your request.";

/// Generic failure text when debug details are hidden
const GENERIC_MODEL_ERROR: &str = "Model error";

/// Handler behaviour flags
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatSettings {
    /// Echo instead of calling the model
    pub mock: bool,
    /// Surface underlying failure details
    pub debug: bool,
}

impl From<&Config> for ChatSettings {
    fn from(config: &Config) -> Self {
        Self {
            mock: config.mock,
            debug: config.debug,
        }
    }
}

/// A successful chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Reply text
    pub text: String,
    /// Whether the reply was synthesized in mock mode
    pub mock: bool,
}

/// Why a chat turn produced no reply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Message was empty or whitespace
    #[error("Empty message.")]
    EmptyMessage,

    /// No model client is available
    #[error("Model not initialized. Check server logs and API key.")]
    ModelNotInitialized,

    /// The model call failed
    #[error("{detail}")]
    Model { detail: String },
}

impl ChatError {
    /// Text shown to the user
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Text spoken to the user by the voice loop
    #[must_use]
    pub const fn spoken_message(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "I didn't hear anything.",
            Self::ModelNotInitialized | Self::Model { .. } => SPOKEN_APOLOGY,
        }
    }
}

/// Answers chat messages
///
/// Holds no per-request state; a single instance serves every request.
#[derive(Clone)]
pub struct ChatHandler {
    settings: ChatSettings,
    model: Option<Arc<dyn LanguageModel>>,
}

impl std::fmt::Debug for ChatHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHandler")
            .field("settings", &self.settings)
            .field("model", &self.model.as_ref().map(|m| m.model_id()))
            .finish()
    }
}

impl ChatHandler {
    /// Create a handler
    #[must_use]
    pub fn new(settings: ChatSettings, model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { settings, model }
    }

    /// Create a mock-mode handler with no model
    #[must_use]
    pub fn mock() -> Self {
        Self::new(
            ChatSettings {
                mock: true,
                debug: false,
            },
            None,
        )
    }

    /// Whether replies are mocked
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        self.settings.mock
    }

    /// Whether failure details are exposed
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.settings.debug
    }

    /// Identifier of the configured model, if any
    #[must_use]
    pub fn model_id(&self) -> Option<&str> {
        self.model.as_deref().map(LanguageModel::model_id)
    }

    /// Answer one message
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] for blank input, a missing model, or a failed call
    pub async fn handle(&self, message: &str) -> Result<ChatReply, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        if self.settings.mock {
            tracing::debug!("mock mode, echoing message");
            return Ok(ChatReply {
                text: format!("{MOCK_PREFIX}{message}"),
                mock: true,
            });
        }

        let Some(model) = &self.model else {
            tracing::error!("chat request received but no model client is configured");
            return Err(ChatError::ModelNotInitialized);
        };

        match model.generate(message).await {
            Ok(reply) => {
                let text = extract::reply_text(&reply);
                tracing::info!(
                    model = model.model_id(),
                    kind = reply.kind(),
                    reply_chars = text.len(),
                    "model replied"
                );
                Ok(ChatReply { text, mock: false })
            }
            Err(e) => {
                tracing::error!(model = model.model_id(), error = %e, "model call failed");
                let detail = if self.settings.debug {
                    e.to_string()
                } else {
                    GENERIC_MODEL_ERROR.to_string()
                };
                Err(ChatError::Model { detail })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::extract::ModelReply;
    use crate::{Error, Result};

    /// Fails on prompts containing "fail", answers with the REST shape otherwise
    #[derive(Default)]
    struct ScriptedModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<ModelReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains("fail") {
                return Err(Error::Model("quota exceeded".to_string()));
            }
            Ok(ModelReply::from(json!({
                "candidates": [{"content": {"parts": [{"text": format!("echo {prompt}")}]}}]
            })))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    fn handler(settings: ChatSettings) -> (ChatHandler, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel::default());
        let handler = ChatHandler::new(settings, Some(model.clone() as Arc<dyn LanguageModel>));
        (handler, model)
    }

    #[tokio::test]
    async fn mock_mode_echoes_without_calling_model() {
        let (handler, model) = handler(ChatSettings {
            mock: true,
            debug: false,
        });

        let reply = handler.handle("hello").await.unwrap();
        assert!(reply.mock);
        assert!(reply.text.contains("hello"));
        assert_eq!(reply.text, "(mock) I received: hello");
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let (handler, model) = handler(ChatSettings::default());
        assert_eq!(handler.handle("").await, Err(ChatError::EmptyMessage));
        assert_eq!(handler.handle("  \n").await, Err(ChatError::EmptyMessage));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn real_call_goes_through_extractor() {
        let (handler, model) = handler(ChatSettings::default());
        let reply = handler.handle("hi").await.unwrap();
        assert_eq!(reply.text, "echo hi");
        assert!(!reply.mock);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_does_not_affect_next_request() {
        let (handler, _) = handler(ChatSettings {
            mock: false,
            debug: true,
        });

        let err = handler.handle("please fail").await.unwrap_err();
        assert_eq!(
            err,
            ChatError::Model {
                detail: "model error: quota exceeded".to_string()
            }
        );

        let reply = handler.handle("world").await.unwrap();
        assert_eq!(reply.text, "echo world");
    }

    #[tokio::test]
    async fn failure_detail_hidden_without_debug() {
        let (handler, _) = handler(ChatSettings {
            mock: false,
            debug: false,
        });
        let err = handler.handle("fail").await.unwrap_err();
        assert_eq!(err.user_message(), "Model error");
        assert_eq!(err.spoken_message(), SPOKEN_APOLOGY);
    }

    #[tokio::test]
    async fn missing_model_is_an_error() {
        let handler = ChatHandler::new(ChatSettings::default(), None);
        assert_eq!(
            handler.handle("hi").await,
            Err(ChatError::ModelNotInitialized)
        );
        assert_eq!(
            ChatError::ModelNotInitialized.user_message(),
            "Model not initialized. Check server logs and API key."
        );
    }
}
