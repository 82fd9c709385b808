//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use parley::api::{self, AppState};
use parley::{ChatHandler, ChatSettings, Error, LanguageModel, ModelReply, Result};
use tower::ServiceExt;

/// Model that replies with a fixed value and counts calls
pub struct StaticModel {
    reply: serde_json::Value,
    pub calls: AtomicUsize,
}

impl StaticModel {
    pub fn new(reply: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for StaticModel {
    async fn generate(&self, _prompt: &str) -> Result<ModelReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelReply::from(self.reply.clone()))
    }

    fn model_id(&self) -> &str {
        "static"
    }
}

/// Model whose every call fails
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> Result<ModelReply> {
        Err(Error::Model("Gemini API error 429 Too Many Requests: quota".to_string()))
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// Handler over the given model
pub fn handler(model: Option<Arc<dyn LanguageModel>>, mock: bool, debug: bool) -> ChatHandler {
    ChatHandler::new(ChatSettings { mock, debug }, model)
}

/// Build a test API router
pub fn build_test_router(chat: ChatHandler) -> Router {
    api::router(Arc::new(AppState { chat }))
}

/// Send a request and return status plus JSON body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// `POST /api/chat` with a raw body
pub fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
