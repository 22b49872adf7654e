// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{normalize_vector, Embedder};
use crate::rag::RagError;

/// Feature-hashing embedder.
///
/// Each lowercase word is hashed into one of `dimensions` buckets with a
/// hash-derived sign, then the vector is L2-normalized. Texts sharing words
/// end up with positive cosine similarity, which is enough for retrieval
/// without a model server.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_name: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, RagError> {
        if dimensions == 0 {
            return Err(RagError::Embedding(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            dimensions,
            model_name: format!("offline-hashing-{}", dimensions),
        })
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let mut tokens = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

            embedding[bucket] += sign;
            tokens += 1;
        }

        // no words at all: fixed direction so cosine distance stays defined
        if tokens == 0 {
            embedding[0] = 1.0;
        }

        normalize_vector(&embedding)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.embed(text))
    }
}
