// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! On-disk layout of a persisted index
//!
//! ```text
//! <persist_dir>/
//!   manifest.json   IndexManifest (JSON)
//!   chunks.bin      Vec<PersistedChunk> (bincode)
//! ```
//!
//! A directory is written complete into a sibling temp dir and then renamed
//! into place, so readers either see no directory or a finished one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::rag::RagError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHUNKS_FILE: &str = "chunks.bin";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexManifest {
    pub version: u32,
    /// Embedder that produced the stored vectors
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_count: usize,
    /// SHA-256 of the corpus text at build time; informational only
    pub corpus_sha256: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedChunk {
    pub id: usize,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    pub vector: Vec<f32>,
}

impl IndexManifest {
    /// Check the manifest against the chunk file it was loaded with
    pub fn validate(&self, chunks: &[PersistedChunk]) -> Result<(), RagError> {
        if self.version != FORMAT_VERSION {
            return Err(RagError::IndexPersistence(format!(
                "Unsupported index format version {}",
                self.version
            )));
        }

        if chunks.len() != self.chunk_count {
            return Err(RagError::IndexPersistence(format!(
                "Chunk count mismatch: manifest says {} but found {} chunks",
                self.chunk_count,
                chunks.len()
            )));
        }

        if self.chunk_count > 0 && self.dimensions == 0 {
            return Err(RagError::IndexPersistence(
                "Invalid dimensions: must be > 0".to_string(),
            ));
        }

        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.id != i {
                return Err(RagError::IndexPersistence(format!(
                    "Chunk IDs must be sequential: expected {}, got {}",
                    i, chunk.id
                )));
            }
            if chunk.vector.len() != self.dimensions {
                return Err(RagError::IndexPersistence(format!(
                    "Chunk {} has {}D vector, manifest says {}D",
                    i,
                    chunk.vector.len(),
                    self.dimensions
                )));
            }
        }

        Ok(())
    }
}

fn io_error(context: &str, path: &Path, err: impl std::fmt::Display) -> RagError {
    RagError::IndexPersistence(format!("{} {}: {}", context, path.display(), err))
}

/// Whether `dir` holds a persisted index
pub fn exists(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

/// Fail when `dir` is occupied by something other than a persisted index.
///
/// An absent or empty directory is fine; the staged rename replaces it.
pub fn ensure_usable(dir: &Path) -> Result<(), RagError> {
    if exists(dir) {
        return Ok(());
    }

    let occupied = match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_some(),
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(_) => dir.exists(),
    };

    if occupied {
        return Err(RagError::IndexPersistence(format!(
            "{} exists but holds no {}; move it aside or point INDEX_PERSIST_DIR elsewhere",
            dir.display(),
            MANIFEST_FILE
        )));
    }

    Ok(())
}

pub fn load(dir: &Path) -> Result<(IndexManifest, Vec<PersistedChunk>), RagError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_json =
        fs::read(&manifest_path).map_err(|e| io_error("Failed to read", &manifest_path, e))?;
    let manifest: IndexManifest = serde_json::from_slice(&manifest_json)
        .map_err(|e| io_error("Failed to parse", &manifest_path, e))?;

    let chunks_path = dir.join(CHUNKS_FILE);
    let chunk_bytes =
        fs::read(&chunks_path).map_err(|e| io_error("Failed to read", &chunks_path, e))?;
    let chunks: Vec<PersistedChunk> = bincode::deserialize(&chunk_bytes)
        .map_err(|e| io_error("Failed to decode", &chunks_path, e))?;

    manifest.validate(&chunks)?;
    debug!(
        "Loaded persisted index from {} ({} chunks)",
        dir.display(),
        chunks.len()
    );

    Ok((manifest, chunks))
}

/// Write a complete index directory at `dir`.
///
/// Returns `Ok(false)` without touching anything if another writer put a
/// finished directory in place first.
pub fn save(
    dir: &Path,
    manifest: &IndexManifest,
    chunks: &[PersistedChunk],
) -> Result<bool, RagError> {
    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| io_error("Failed to create", &parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".index-staging-")
        .tempdir_in(&parent)
        .map_err(|e| io_error("Failed to create staging dir in", &parent, e))?;

    let manifest_json = serde_json::to_vec_pretty(manifest)
        .map_err(|e| RagError::IndexPersistence(e.to_string()))?;
    let staged_manifest = staging.path().join(MANIFEST_FILE);
    fs::write(&staged_manifest, manifest_json)
        .map_err(|e| io_error("Failed to write", &staged_manifest, e))?;

    let chunk_bytes =
        bincode::serialize(chunks).map_err(|e| RagError::IndexPersistence(e.to_string()))?;
    let staged_chunks = staging.path().join(CHUNKS_FILE);
    fs::write(&staged_chunks, chunk_bytes)
        .map_err(|e| io_error("Failed to write", &staged_chunks, e))?;

    match fs::rename(staging.path(), dir) {
        Ok(()) => {
            // the staging path no longer exists; nothing left to clean up
            let _ = staging.into_path();
            info!(
                "Persisted index to {} ({} chunks)",
                dir.display(),
                manifest.chunk_count
            );
            Ok(true)
        }
        Err(e) if exists(dir) => {
            warn!(
                "Persisted index appeared at {} during build ({}), keeping existing",
                dir.display(),
                e
            );
            Ok(false)
        }
        Err(e) => Err(io_error("Failed to move index into", dir, e)),
    }
}

/// Delete a persisted index. Returns whether anything was removed.
pub fn remove(dir: &Path) -> Result<bool, RagError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            info!("Removed persisted index at {}", dir.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error("Failed to remove", dir, e)),
    }
}
