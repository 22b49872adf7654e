// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text embedding backends
//!
//! `OpenAiEmbedder` calls an OpenAI-compatible `/v1/embeddings` endpoint.
//! `HashingEmbedder` is a deterministic, network-free backend used for
//! offline runs and tests.

pub mod hashing;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{ModelBackend, ModelConfig};
use crate::rag::RagError;

pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier recorded in persisted index manifests
    fn model_name(&self) -> &str;

    /// Vector width when known up front
    fn dimensions(&self) -> Option<usize>;

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

/// Scale a vector to unit length; zero vectors are returned unchanged
pub fn normalize_vector(vector: &[f32]) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|x| x / magnitude).collect()
}

/// Build the embedder selected by `MODEL_BACKEND`
pub fn create_embedder(config: &ModelConfig) -> Result<Arc<dyn Embedder>, RagError> {
    match config.backend {
        ModelBackend::OpenAi => Ok(Arc::new(OpenAiEmbedder::new(config)?)),
        ModelBackend::Offline => Ok(Arc::new(HashingEmbedder::new(config.offline_dimensions)?)),
    }
}
