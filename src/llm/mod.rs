//! Outbound generative-language API plumbing.
//!
//! # Layers
//!
//! - [`JsonTransport`]: one POST, categorized failure ([`transport`])
//! - [`RetryingCaller`]: exponential backoff over a transport ([`retry`])
//! - [`gemini`]: `generateContent` wire types and endpoint URL
//!
//! The persona and answer extraction live in [`crate::chat`].

pub mod gemini;
pub mod retry;
pub mod transport;

pub use retry::{CallError, RetryPolicy, RetryingCaller};
pub use transport::{AttemptError, JsonTransport, ReqwestTransport};

/// Gemini connection and model settings.
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    /// API key; `None` disables the chatbot endpoint.
    pub api_key: Option<String>,
    /// Base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: String,
    /// Model identifier, e.g. `gemini-2.5-flash`.
    pub model: String,
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}
