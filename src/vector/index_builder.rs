// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Builds searchable indexes from a corpus, optionally persisted to disk
//!
//! With persistence enabled the first build writes the index directory and
//! every later build reuses it without embedding anything. A reused index is
//! not compared against the current corpus; call `reset_persisted` after the
//! corpus changes.

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::hnsw::HnswIndex;
use super::persistence::{self, IndexManifest, PersistedChunk, FORMAT_VERSION};
use super::splitter::RecursiveCharacterSplitter;
use super::{Chunk, Document, VectorIndex};
use crate::config::RagConfig;
use crate::embeddings::Embedder;
use crate::rag::RagError;

/// Build counters since process start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub fresh_builds: usize,
    pub persisted_reuses: usize,
    pub embedded_chunks: usize,
}

pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    splitter: RecursiveCharacterSplitter,
    persist_directory: PathBuf,
    /// Serializes persisted builds, loads and resets within this process
    persist_lock: Mutex<()>,
    fresh_builds: AtomicUsize,
    persisted_reuses: AtomicUsize,
    embedded_chunks: AtomicUsize,
}

fn corpus_fingerprint(corpus: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for document in corpus {
        hasher.update(document.content.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn join_error(e: tokio::task::JoinError) -> RagError {
    RagError::IndexBuild(format!("Task join error: {}", e))
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, config: &RagConfig) -> Self {
        Self {
            embedder,
            splitter: RecursiveCharacterSplitter::new(config.chunk_size, config.chunk_overlap),
            persist_directory: config.persist_directory.clone(),
            persist_lock: Mutex::new(()),
            fresh_builds: AtomicUsize::new(0),
            persisted_reuses: AtomicUsize::new(0),
            embedded_chunks: AtomicUsize::new(0),
        }
    }

    pub fn persist_directory(&self) -> &Path {
        &self.persist_directory
    }

    pub fn has_persisted(&self) -> bool {
        persistence::exists(&self.persist_directory)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            fresh_builds: self.fresh_builds.load(Ordering::SeqCst),
            persisted_reuses: self.persisted_reuses.load(Ordering::SeqCst),
            embedded_chunks: self.embedded_chunks.load(Ordering::SeqCst),
        }
    }

    /// Produce an index for `corpus`.
    ///
    /// - `persist` and a persisted index exists: load it, `corpus` is ignored
    /// - `persist` and none exists: build, then write the directory
    /// - otherwise: build in memory
    pub async fn build(&self, corpus: &[Document], persist: bool) -> Result<VectorIndex, RagError> {
        if !persist {
            let (index, _) = self.build_fresh(corpus).await?;
            return Ok(index);
        }

        let _guard = self.persist_lock.lock().await;

        if let Some(index) = self.load_locked().await? {
            return Ok(index);
        }

        let (index, records) = self.build_fresh(corpus).await?;
        let manifest = IndexManifest {
            version: FORMAT_VERSION,
            embedding_model: self.embedder.model_name().to_string(),
            dimensions: index.dimensions(),
            chunk_count: records.len(),
            corpus_sha256: corpus_fingerprint(corpus),
            created_at: Utc::now(),
        };

        let dir = self.persist_directory.clone();
        tokio::task::spawn_blocking(move || persistence::save(&dir, &manifest, &records))
            .await
            .map_err(join_error)??;

        Ok(index)
    }

    /// Load the persisted index if one exists
    pub async fn load_persisted(&self) -> Result<Option<VectorIndex>, RagError> {
        let _guard = self.persist_lock.lock().await;
        self.load_locked().await
    }

    /// Delete the persisted index so the next persisted build re-embeds
    pub async fn reset_persisted(&self) -> Result<bool, RagError> {
        let _guard = self.persist_lock.lock().await;
        let dir = self.persist_directory.clone();
        tokio::task::spawn_blocking(move || persistence::remove(&dir))
            .await
            .map_err(join_error)?
    }

    async fn load_locked(&self) -> Result<Option<VectorIndex>, RagError> {
        if !self.has_persisted() {
            persistence::ensure_usable(&self.persist_directory)?;
            return Ok(None);
        }

        let dir = self.persist_directory.clone();
        let (manifest, records) = tokio::task::spawn_blocking(move || persistence::load(&dir))
            .await
            .map_err(join_error)??;

        if manifest.embedding_model != self.embedder.model_name() {
            return Err(RagError::IndexPersistence(format!(
                "Persisted index at {} was built with '{}' but the current embedder is '{}'; reset the index",
                self.persist_directory.display(),
                manifest.embedding_model,
                self.embedder.model_name()
            )));
        }

        let dimensions = manifest.dimensions;
        let (chunks, vectors): (Vec<Chunk>, Vec<Vec<f32>>) = records
            .into_iter()
            .map(|r| {
                (
                    Chunk {
                        id: r.id,
                        text: r.text,
                        metadata: r.metadata,
                    },
                    r.vector,
                )
            })
            .unzip();

        let graph = tokio::task::spawn_blocking(move || HnswIndex::build(&vectors, dimensions))
            .await
            .map_err(join_error)??;

        self.persisted_reuses.fetch_add(1, Ordering::SeqCst);
        info!(
            "Reusing persisted index at {} ({} chunks, built {})",
            self.persist_directory.display(),
            chunks.len(),
            manifest.created_at
        );

        Ok(Some(VectorIndex::new(
            chunks,
            graph,
            manifest.embedding_model,
        )))
    }

    async fn build_fresh(
        &self,
        corpus: &[Document],
    ) -> Result<(VectorIndex, Vec<PersistedChunk>), RagError> {
        let chunks = self.splitter.split_documents(corpus);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        debug!(
            "Split {} documents into {} chunks",
            corpus.len(),
            chunks.len()
        );

        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_documents(&texts).await?
        };

        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimensions = vectors
            .first()
            .map(Vec::len)
            .or_else(|| self.embedder.dimensions())
            .unwrap_or(0);
        if let Some(expected) = self.embedder.dimensions() {
            if dimensions != expected {
                return Err(RagError::Embedding(format!(
                    "Embedder returned {}D vectors, expected {}D",
                    dimensions, expected
                )));
            }
        }

        let (graph, vectors) = tokio::task::spawn_blocking(move || {
            HnswIndex::build(&vectors, dimensions).map(|graph| (graph, vectors))
        })
        .await
        .map_err(join_error)??;

        let records = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| PersistedChunk {
                id: chunk.id,
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                vector,
            })
            .collect();

        self.fresh_builds.fetch_add(1, Ordering::SeqCst);
        self.embedded_chunks.fetch_add(chunks.len(), Ordering::SeqCst);
        info!("Built index with {} chunks ({}D)", chunks.len(), dimensions);

        Ok((
            VectorIndex::new(chunks, graph, self.embedder.model_name().to_string()),
            records,
        ))
    }
}
