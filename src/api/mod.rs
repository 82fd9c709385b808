//! HTTP API server for the web variant

pub mod chat;
pub mod health;
pub mod page;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::chat::ChatHandler;
use crate::config::ServerConfig;

/// Shared state for API handlers
///
/// Read-only after construction; requests share nothing mutable.
#[derive(Debug)]
pub struct AppState {
    pub chat: ChatHandler,
}

/// Build the router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    // CORS layer for cross-origin requests from other frontends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(page::router(state.clone()))
        .merge(chat::router(state.clone()))
        .merge(health::router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    chat: ChatHandler,
    host: String,
    port: u16,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(chat: ChatHandler) -> Self {
        Self {
            chat,
            host: "0.0.0.0".to_string(),
            port: crate::config::DEFAULT_PORT,
        }
    }

    /// Set the bind address and port from server configuration
    #[must_use]
    pub fn server_config(mut self, config: &ServerConfig) -> Self {
        self.host.clone_from(&config.host);
        self.port = config.port;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(AppState { chat: self.chat }),
            host: self.host,
            port: self.port,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<AppState>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Router serving this server's state
    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        if self.state.chat.is_mock() {
            tracing::info!("mock mode enabled: replies echo the request");
        }

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server on {addr}: {e}")))?;

        tracing::info!(
            host = %self.host,
            port = self.port,
            mock = self.state.chat.is_mock(),
            debug = self.state.chat.is_debug(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutdown requested");
                }
            })
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}
