//! Language model client
//!
//! The chat handler only sees the [`LanguageModel`] trait; [`GeminiClient`]
//! is the production implementation over the Gemini `generateContent` REST
//! endpoint.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::{Config, copy_secret};
use crate::extract::ModelReply;
use crate::{Error, Result};

/// A hosted language model that answers a single prompt
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Submit one prompt and return the raw reply
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    async fn generate(&self, prompt: &str) -> Result<ModelReply>;

    /// Model identifier, for logging
    fn model_id(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString, model: String, base_url: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("Google API key required for Gemini".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration
    ///
    /// Returns `None` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be constructed
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        config
            .api_key
            .as_ref()
            .map(|key| {
                Self::new(
                    copy_secret(key),
                    config.model.clone(),
                    config.api_base_url.clone(),
                )
            })
            .transpose()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<ModelReply> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "calling Gemini");

        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gemini request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Model(format!("Gemini API error {status}: {body}")));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Gemini response");
            e
        })?;

        let reply = ModelReply::from(body);
        tracing::debug!(kind = reply.kind(), "Gemini reply received");
        Ok(reply)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
