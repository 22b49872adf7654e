// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ingestion endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::response::IngestResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// Multipart field carrying the document
pub const PDF_FIELD: &str = "pdf";

const NO_FILE_MESSAGE: &str = "No PDF file provided";
const FAILURE_MESSAGE: &str = "Failed to process file";

/// POST /process_new_pdf - Extract and store the text of an uploaded PDF
///
/// # Errors
/// - 400 Bad Request: no `pdf` part, unreadable form, non-`.pdf` filename
/// - 500 Internal Server Error: extraction or storage failed
pub async fn process_new_pdf_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejected upload: {}", e);
        ApiError::validation(PDF_FIELD, NO_FILE_MESSAGE)
    })?;

    let (filename, bytes) = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::validation(PDF_FIELD, NO_FILE_MESSAGE)),
            Err(e) => {
                warn!("Unreadable multipart body: {}", e);
                return Err(ApiError::validation(PDF_FIELD, NO_FILE_MESSAGE));
            }
        };

        if field.name() != Some(PDF_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            warn!("Failed to read upload '{}': {}", filename, e);
            ApiError::validation(PDF_FIELD, NO_FILE_MESSAGE)
        })?;
        break (filename, bytes);
    };

    let request_id = Uuid::new_v4();
    info!(
        "[{}] Received upload '{}' ({} bytes)",
        request_id,
        filename,
        bytes.len()
    );

    match state.ingestor.ingest(&bytes, &filename).await {
        Ok(record) => Ok(Json(record.into())),
        Err(e) => {
            error!(
                "[{}] Ingestion of '{}' failed [{}]: {}",
                request_id,
                filename,
                e.error_code(),
                e
            );
            Err(ApiError::from_rag(&e, PDF_FIELD, FAILURE_MESSAGE))
        }
    }
}
