// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the ingestion and query pipeline
//!
//! Every failure the pipeline can produce is one of these kinds:
//! - input problems (validation)
//! - content store failures (not found, access denied, transient)
//! - PDF extraction failures
//! - embedding, index build and index persistence failures
//! - language model failures

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    /// Caller supplied input that can never succeed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Corpus or object missing from the content store
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Network or server-side store failure
    #[error("Content store unavailable: {0}")]
    TransientStore(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Failed to build index: {0}")]
    IndexBuild(String),

    #[error("Index persistence failed: {0}")]
    IndexPersistence(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),
}

impl From<StorageError> for RagError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(location) => RagError::NotFound(location),
            StorageError::AccessDenied(location) => RagError::AccessDenied(location),
            StorageError::InvalidKey(msg) => RagError::Validation(msg),
            StorageError::Transient(msg) => RagError::TransientStore(msg),
            StorageError::Encoding(msg) => RagError::Extraction(msg),
            other => RagError::TransientStore(other.to_string()),
        }
    }
}

impl RagError {
    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::Validation(_) => "VALIDATION_ERROR",
            RagError::NotFound(_) => "NOT_FOUND",
            RagError::AccessDenied(_) => "ACCESS_DENIED",
            RagError::TransientStore(_) => "STORE_UNAVAILABLE",
            RagError::Extraction(_) => "EXTRACTION_FAILED",
            RagError::Embedding(_) => "EMBEDDING_FAILED",
            RagError::IndexBuild(_) => "INDEX_BUILD_FAILED",
            RagError::IndexPersistence(_) => "INDEX_PERSISTENCE_FAILED",
            RagError::ModelInvocation(_) => "MODEL_INVOCATION_FAILED",
        }
    }

    /// Whether the same request could succeed later. Nothing retries
    /// automatically; this only informs logs and callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::TransientStore(_) | RagError::Embedding(_) | RagError::ModelInvocation(_)
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RagError::Validation(_))
    }
}
