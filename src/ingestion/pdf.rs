// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF text extraction
//!
//! Pages are read in document order and their text is concatenated exactly
//! as the parser emits it; no separator is inserted between pages.

use lopdf::Document;
use tracing::{debug, warn};

use crate::rag::RagError;

/// Extract the text of every page of an in-memory PDF.
///
/// Parsing is CPU bound, so it runs on the blocking pool.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, RagError> {
    tokio::task::spawn_blocking(move || extract_pages(&bytes))
        .await
        .map_err(|e| RagError::Extraction(format!("Task join error: {}", e)))?
}

fn extract_pages(bytes: &[u8]) -> Result<String, RagError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| RagError::Extraction(format!("Failed to parse PDF: {}", e)))?;

    let pages = doc.get_pages();
    let mut text = String::new();

    for page_number in pages.keys() {
        let page_text = doc.extract_text(&[*page_number]).map_err(|e| {
            RagError::Extraction(format!("Failed to extract page {}: {}", page_number, e))
        })?;
        text.push_str(&page_text);
    }

    if text.trim().is_empty() {
        warn!("PDF with {} pages contained no extractable text", pages.len());
    } else {
        debug!("Extracted {} chars from {} pages", text.len(), pages.len());
    }

    Ok(text)
}
