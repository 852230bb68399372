//! `/api/chatbot` handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::AppState;
use crate::chat::ChatAnswer;
use crate::error::ApiError;

/// Request body for the ask endpoint.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// POST /api/chatbot/ask - Ask the Rigveda persona a question.
///
/// A body that is not JSON, or JSON without a string `prompt`, is treated as
/// an empty prompt so the gateway reports it with the usual JSON error. A
/// body that cannot be read at all (oversized, broken stream) keeps its own
/// status, e.g. 413.
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let prompt = match payload {
        Ok(Json(req)) => req.prompt.unwrap_or_default(),
        Err(
            rejection @ (JsonRejection::MissingJsonContentType(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::JsonDataError(_)),
        ) => {
            debug!(error = %rejection, "Unreadable chatbot request body");
            String::new()
        }
        Err(rejection) => {
            warn!(error = %rejection, "Rejected chatbot request body");
            return Err(ApiError::Body(rejection));
        }
    };

    let answer = state.chat.ask(&prompt).await?;
    Ok(Json(answer))
}
