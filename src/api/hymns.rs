//! `/api/hymns` handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;

use crate::AppState;
use crate::error::ApiError;
use crate::hymns::DeityGraph;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/hymns - Entire corpus.
pub async fn list_all(State(state): State<AppState>) -> Result<Response, ApiError> {
    let store = state.corpus()?;
    Ok(Json(store.all()).into_response())
}

/// GET /api/hymns/mandala/{id}
pub async fn by_mandala(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let store = state.corpus()?;
    let hits = store.by_mandala(&id);
    if hits.is_empty() {
        return Err(ApiError::NotFound(format!("Mandala {id} not found.")));
    }
    Ok(Json(hits).into_response())
}

/// GET /api/hymns/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let store = state.corpus()?;
    let hits = store.search(query.q.as_deref().unwrap_or_default())?;
    Ok(Json(hits).into_response())
}

/// GET /api/hymns/{mandala}/{hymn}/{verse}
pub async fn verse(
    State(state): State<AppState>,
    Path((mandala, hymn, verse)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let store = state.corpus()?;
    match store.verse(&mandala, &hymn, &verse) {
        Some(record) => Ok(Json(record).into_response()),
        None => Err(ApiError::NotFound(format!(
            "Verse {mandala}.{hymn}.{verse} not found."
        ))),
    }
}

/// GET /api/hymns/themes/{name}
pub async fn by_theme(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let store = state.corpus()?;
    let hits = store.by_theme(&name);
    if hits.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No verses found for theme: {name}"
        )));
    }
    Ok(Json(hits).into_response())
}

/// GET /api/hymns/deity-graph
pub async fn deity_graph(State(state): State<AppState>) -> Result<Json<DeityGraph>, ApiError> {
    let store = state.corpus()?;
    tokio::task::spawn_blocking(move || store.deity_graph())
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Error generating graph");
            ApiError::Internal("Failed to generate deity graph".to_string())
        })
}

/// GET /api/hymns/deity/{name}
pub async fn by_deity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let store = state.corpus()?;
    match store.by_deity(&name) {
        Some(summary) => Ok(Json(summary).into_response()),
        None => Err(ApiError::NotFound(format!(
            "No hymns found for deity {name}"
        ))),
    }
}
