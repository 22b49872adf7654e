// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document ingestion: PDF upload -> extracted text -> content store

pub mod pdf;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{RagConfig, TEXT_KEY_PREFIX};
use crate::rag::RagError;
use crate::storage::TextStore;

/// Metadata describing one successful ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub filename: String,
    /// Length of the uploaded document in bytes
    pub byte_size: usize,
    pub storage_uri: String,
    pub text_key: String,
}

impl IngestionRecord {
    pub fn confirmation_message(&self) -> String {
        format!(
            "File '{}' processed successfully and saved to '{}'.",
            self.filename, self.storage_uri
        )
    }
}

/// Only `.pdf` (lowercase) filenames are accepted.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.ends_with(".pdf")
}

/// Storage key of the text blob for an uploaded file:
/// `text_files/<base name without extension>.txt`.
pub fn text_key_for(filename: &str) -> Result<String, RagError> {
    let base = filename
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(filename);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };

    if stem.is_empty() || stem == "." || stem == ".." {
        return Err(RagError::Validation(format!(
            "Cannot derive a storage key from '{}'",
            filename
        )));
    }

    Ok(format!("{}{}.txt", TEXT_KEY_PREFIX, stem))
}

pub struct DocumentIngestor {
    store: Arc<dyn TextStore>,
    bucket: String,
}

impl DocumentIngestor {
    pub fn new(store: Arc<dyn TextStore>, config: &RagConfig) -> Self {
        Self {
            store,
            bucket: config.bucket.clone(),
        }
    }

    /// Extract the text of a PDF and store it as the file's text blob.
    ///
    /// A previous blob for the same filename is overwritten. Nothing is
    /// cleaned up if the write fails after extraction.
    pub async fn ingest(&self, bytes: &[u8], filename: &str) -> Result<IngestionRecord, RagError> {
        if !is_pdf_filename(filename) {
            return Err(RagError::Validation("File is not a PDF.".to_string()));
        }
        if bytes.is_empty() {
            return Err(RagError::Validation("Uploaded file is empty".to_string()));
        }
        let text_key = text_key_for(filename)?;

        let text = pdf::extract_text(bytes.to_vec()).await?;
        if text.is_empty() {
            warn!("No text extracted from {}", filename);
        }

        let ack = self.store.write(&self.bucket, &text_key, &text).await?;
        info!(
            "Ingested {} ({} bytes) -> {} ({} chars)",
            filename,
            bytes.len(),
            ack.uri,
            ack.bytes_written
        );

        Ok(IngestionRecord {
            filename: filename.to_string(),
            byte_size: bytes.len(),
            storage_uri: ack.uri,
            text_key,
        })
    }
}
