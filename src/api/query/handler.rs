// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Query endpoint handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::request::{QueryRequest, NO_TEXT_MESSAGE};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::rag::QueryOutcome;

const FAILURE_MESSAGE: &str = "Failed to handle query";

/// POST /handle_new_query - Answer a question from the corpus
///
/// # Response
/// - `{"answer": ...}` on success
/// - `{"error": "Query to exit received."}` (200) for an exit token
///
/// # Errors
/// - 400 Bad Request: invalid JSON, missing or empty `query`
/// - 500 Internal Server Error: store, embedding or model failure
pub async fn handle_new_query_handler(
    State(state): State<AppState>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryOutcome>, ApiError> {
    let Json(request) = request.map_err(|e| {
        warn!("Rejected query body: {}", e);
        ApiError::validation("query", NO_TEXT_MESSAGE)
    })?;
    let query = request.validate()?;
    let request_id = Uuid::new_v4();
    debug!("[{}] Query received ({} chars)", request_id, query.len());

    match state.query_handler.handle(query).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            error!("[{}] Query failed [{}]: {}", request_id, e.error_code(), e);
            Err(ApiError::from_rag(&e, "query", FAILURE_MESSAGE))
        }
    }
}
