//! Handler error type and its JSON rendering.
//!
//! Corpus routes answer `{"message": ...}` for client-side misses; server-side
//! failures and every chatbot error answer `{"error": ..., "details"?: ...}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::chat::ChatError;
use crate::hymns::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Chat(#[from] ChatError),
    /// A dependency failed at startup; the route cannot give a truthful answer.
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
    /// The request body could not be read at all (e.g. over the size limit).
    #[error(transparent)]
    Body(JsonRejection),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Chat(ChatError::EmptyPrompt) => StatusCode::BAD_REQUEST,
            Self::Chat(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Body(rejection) => rejection.status(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmptyQuery => Self::BadRequest(e.to_string()),
            StoreError::Read { .. } | StoreError::Parse { .. } => Self::Unavailable(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::BadRequest(msg) | Self::NotFound(msg) => json!({ "message": msg }),
            Self::Chat(err) => match err.details() {
                Some(details) => json!({ "error": err.to_string(), "details": details }),
                None => json!({ "error": err.to_string() }),
            },
            Self::Unavailable(msg) | Self::Internal(msg) => json!({ "error": msg }),
            Self::Body(rejection) => json!({ "error": rejection.body_text() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::BadRequest(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ChatError::EmptyPrompt).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ChatError::MissingApiKey).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(StoreError::EmptyQuery).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unavailable(String::new()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
