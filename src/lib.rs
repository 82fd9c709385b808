//! Parley - voice and text chat front-ends for the Gemini API
//!
//! Two front-ends share one chat handler:
//! - `listen`: a local loop (microphone → STT → Gemini → TTS → speakers)
//! - `serve`: a web page plus `POST /api/chat` proxying to Gemini
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │  voice::TranscriptionSource  │   │     api (axum, /api/chat)    │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                └─────────────┬────────────────────┘
//!                ┌─────────────▼───────────────┐
//!                │     chat::ChatHandler       │── mock echo
//!                └─────────────┬───────────────┘
//!                ┌─────────────▼───────────────┐
//!                │  llm::LanguageModel (Gemini)│
//!                └─────────────┬───────────────┘
//!                ┌─────────────▼───────────────┐
//!                │  extract::reply_text        │
//!                └─────────────────────────────┘
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod voice;

pub use chat::{ChatError, ChatHandler, ChatReply, ChatSettings};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{ExtractError, ModelReply, extract_text, reply_text};
pub use llm::{GeminiClient, LanguageModel};
