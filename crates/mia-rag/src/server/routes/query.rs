//! Question answering and retrieval-only search endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::pipeline::search_documents;
use crate::server::state::AppState;
use crate::types::{CachedResponse, QueryRequest, SearchRequest, SearchResponse};

/// POST /query - Answer a question from the indexed documents
pub async fn query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<CachedResponse>> {
    let pipeline = state.pipeline()?;
    let Json(request) = payload.map_err(|e| Error::invalid_input(e.body_text()))?;

    // Detached so an answer completing after the client left still gets cached
    let response = tokio::spawn(async move { pipeline.answer(&request).await })
        .await
        .map_err(|e| Error::internal(format!("Query task failed: {}", e)))??;

    Ok(Json(response))
}

/// POST /search - Retrieve matching chunks without calling the LLM
pub async fn search(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>> {
    let store = state.search_store()?;
    let Json(request) = payload.map_err(|e| Error::invalid_input(e.body_text()))?;

    let response = search_documents(&**store, &request, &state.config().query).await?;

    Ok(Json(response))
}
