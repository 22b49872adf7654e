// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector indexing: splitting, embedding, HNSW search and persistence

pub mod hnsw;
pub mod index_builder;
pub mod persistence;
pub mod splitter;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rag::RagError;

pub use hnsw::{HnswIndex, Neighbor};
pub use index_builder::{IndexBuilder, IndexStats};
pub use persistence::{IndexManifest, PersistedChunk};
pub use splitter::RecursiveCharacterSplitter;

/// Metadata key holding the location a document was loaded from
pub const SOURCE_KEY: &str = "source";

/// A unit of corpus text handed to the index builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_source(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// Splitter output; `id` is the chunk's position in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Searchable index over one corpus
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    graph: HnswIndex,
    embedding_model: String,
}

impl VectorIndex {
    /// `chunks[i]` must correspond to position `i` in `graph`
    pub(crate) fn new(chunks: Vec<Chunk>, graph: HnswIndex, embedding_model: String) -> Self {
        Self {
            chunks,
            graph,
            embedding_model,
        }
    }

    /// Top-`k` chunks for an embedded query, most similar first
    pub fn retrieve(&self, query_vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, RagError> {
        if self.chunks.is_empty() {
            return Ok(vec![]);
        }

        Ok(self
            .graph
            .search(query_vector, k)?
            .into_iter()
            .filter_map(|hit| {
                self.chunks.get(hit.position).map(|chunk| RetrievedChunk {
                    chunk: chunk.clone(),
                    score: hit.score,
                })
            })
            .collect())
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.graph.dimensions()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}
