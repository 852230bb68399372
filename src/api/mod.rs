//! HTTP routes.

pub mod chatbot;
pub mod hymns;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// Liveness text for `GET /`.
pub const LIVENESS_TEXT: &str = "Rigveda API is live and running! 🔱";

/// Build the route table (no middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness))
        // Corpus
        .route("/api/hymns", get(hymns::list_all))
        .route("/api/hymns/", get(hymns::list_all))
        .route("/api/hymns/mandala/{id}", get(hymns::by_mandala))
        .route("/api/hymns/deity-graph", get(hymns::deity_graph))
        .route("/api/hymns/deity/{name}", get(hymns::by_deity))
        .route("/api/hymns/search", get(hymns::search))
        .route("/api/hymns/themes/{name}", get(hymns::by_theme))
        .route("/api/hymns/{mandala}/{hymn}/{verse}", get(hymns::verse))
        // Chatbot
        .route("/api/chatbot/ask", post(chatbot::ask))
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}
