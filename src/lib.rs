//! Rigveda API
//!
//! A small REST service over a static Rigveda verse corpus, plus a chatbot
//! endpoint that forwards prompts to Gemini under a fixed Vedic-scholar
//! persona.
//!
//! # Modules
//!
//! - [`hymns`]: corpus records, queries, and the deity graph
//! - [`llm`]: outbound transport, retry/backoff, Gemini wire types
//! - [`chat`]: persona-constrained chat gateway
//! - [`api`]: axum handlers and routes
//! - [`server`]: state construction, middleware, and serving
//! - [`config`]: layered configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod hymns;
pub mod llm;
pub mod server;

use std::sync::Arc;

use chat::ChatGateway;
use error::ApiError;
use hymns::VerseStore;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Verse corpus; `None` when it failed to load at startup.
    pub store: Option<Arc<VerseStore>>,
    /// Gemini chat gateway.
    pub chat: Arc<ChatGateway>,
}

impl AppState {
    /// The corpus, or a 503 if it never loaded.
    pub fn corpus(&self) -> Result<Arc<VerseStore>, ApiError> {
        self.store
            .clone()
            .ok_or_else(|| ApiError::Unavailable("Verse corpus is unavailable.".to_string()))
    }
}
