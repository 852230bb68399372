//! Gemini `generateContent` request and response shapes.
//!
//! Only the fields this service reads or writes are modeled. Response types
//! are lenient: every field is optional so a partial or blocked reply still
//! deserializes and can be reported as "no valid response".

use serde::{Deserialize, Serialize};
use url::Url;

use super::GeminiSettings;

/// Body of a `models/{model}:generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub tools: Vec<Tool>,
    pub system_instruction: Content,
}

impl GenerateContentRequest {
    /// A single-turn request with search grounding enabled.
    #[must_use]
    pub fn grounded(prompt: &str, system_instruction: &str) -> Self {
        Self {
            contents: vec![Content::text(prompt)],
            tools: vec![Tool::google_search()],
            system_instruction: Content::text(system_instruction),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

impl Content {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: s.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

/// Tool declaration. Serializes as `{"google_search": {}}`.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub google_search: GoogleSearch,
}

impl Tool {
    #[must_use]
    pub fn google_search() -> Self {
        Self {
            google_search: GoogleSearch {},
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoogleSearch {}

// ─────────────────────────────────────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

impl Candidate {
    /// Text of the first part, if it exists and is non-empty.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_attributions: Vec<GroundingAttribution>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingAttribution {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Build `{base_url}/models/{model}:generateContent?key={api_key}`.
pub fn generate_content_url(settings: &GeminiSettings, api_key: &str) -> Result<Url, url::ParseError> {
    let base = settings.base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{base}/models/{}:generateContent", settings.model))?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}
