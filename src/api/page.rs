//! Web page served at `/`

use std::sync::Arc;

use axum::{Router, extract::State, response::Html, routing::get};

use super::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Build page router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/", get(index)).with_state(state)
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(state.chat.is_mock()))
}

/// Render the page with the mock flag filled in
#[must_use]
pub fn render_index(mock: bool) -> String {
    INDEX_HTML.replace("{{USING_MOCK}}", if mock { "true" } else { "false" })
}
