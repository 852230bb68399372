//! Persona-constrained chat gateway.
//!
//! Wraps a single Gemini `generateContent` call behind a fixed system
//! instruction that limits answers to the Rigveda, with search grounding
//! enabled. Retries happen inside [`RetryingCaller`]; this layer never
//! retries.

use serde::Serialize;
use tracing::{error, info};

use crate::llm::gemini::{GenerateContentRequest, GenerateContentResponse, generate_content_url};
use crate::llm::{GeminiSettings, RetryingCaller};

/// System instruction sent with every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are a knowledgeable and dedicated Vedic scholar and expert on the Rigveda. \
Your primary and sole function is to provide detailed and accurate answers about the Rigveda, its Mandalas, Hymns, \
Deities (like Indra, Agni, Soma, Ushas, etc.), Vedic philosophy, and related historical context. \
You MUST NOT answer questions on any other topic, including modern events, politics, science, other religious texts, \
or general knowledge. If a user asks a non-Rigveda question, politely state: \
\"My purpose is strictly limited to the Rigveda. Please ask me a question about the Vedic text.\"";

/// Chat gateway failures, each mapped to a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// No API key configured.
    #[error("Server configuration error: API key is missing.")]
    MissingApiKey,
    /// Prompt absent or empty.
    #[error("Prompt is required.")]
    EmptyPrompt,
    /// Upstream replied, but without usable answer text.
    #[error("The AI model did not return a valid response.")]
    EmptyResponse,
    /// Upstream could not be reached after retries; `details` carries the summary.
    #[error("We encountered an issue communicating with the AI. Please try again later.")]
    Upstream { details: String },
}

impl ChatError {
    /// Diagnostic text to expose alongside the message, if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Upstream { details } => Some(details),
            _ => None,
        }
    }
}

/// A cited web source backing the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// Answer returned by [`ChatGateway::ask`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAnswer {
    pub response: String,
    pub sources: Vec<Source>,
}

/// Validates prompts, calls Gemini, and extracts answer text and citations.
#[derive(Debug, Clone)]
pub struct ChatGateway {
    settings: GeminiSettings,
    caller: RetryingCaller,
}

impl ChatGateway {
    #[must_use]
    pub fn new(settings: GeminiSettings, caller: RetryingCaller) -> Self {
        Self { settings, caller }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    /// Ask the Rigveda persona a question.
    pub async fn ask(&self, prompt: &str) -> Result<ChatAnswer, ChatError> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            return Err(ChatError::MissingApiKey);
        };
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        let url = generate_content_url(&self.settings, api_key).map_err(|e| {
            error!(error = %e, "Invalid Gemini endpoint configuration");
            ChatError::Upstream {
                details: format!("invalid endpoint: {e}"),
            }
        })?;

        let payload = serde_json::to_value(GenerateContentRequest::grounded(prompt, SYSTEM_INSTRUCTION))
            .map_err(|e| ChatError::Upstream {
                details: e.to_string(),
            })?;

        info!(model = %self.settings.model, prompt_len = prompt.len(), "Forwarding prompt to Gemini");

        let body = self.caller.call(url.as_str(), &payload).await.map_err(|e| {
            error!(error = %e, "Gemini API call failed");
            ChatError::Upstream {
                details: e.to_string(),
            }
        })?;

        extract_answer(body)
    }
}

/// Pull answer text and grounding sources out of a raw response body.
pub fn extract_answer(body: serde_json::Value) -> Result<ChatAnswer, ChatError> {
    let resp: GenerateContentResponse =
        serde_json::from_value(body).map_err(|_| ChatError::EmptyResponse)?;

    let candidate = resp.candidates.first().ok_or(ChatError::EmptyResponse)?;
    let text = candidate.first_text().ok_or(ChatError::EmptyResponse)?;

    let sources = candidate
        .grounding_metadata
        .iter()
        .flat_map(|m| &m.grounding_attributions)
        .filter_map(|a| {
            let web = a.web.as_ref()?;
            let uri = web.uri.as_deref().filter(|s| !s.is_empty())?;
            let title = web.title.as_deref().filter(|s| !s.is_empty())?;
            Some(Source {
                uri: uri.to_string(),
                title: title.to_string(),
            })
        })
        .collect();

    Ok(ChatAnswer {
        response: text.to_string(),
        sources,
    })
}
