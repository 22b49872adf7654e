// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Persisted index directory shared between builders

use pdf_rag_node::{
    config::RagConfig,
    embeddings::HashingEmbedder,
    vector::{persistence, Document, IndexBuilder},
    RagError,
};
use std::sync::Arc;
use tempfile::TempDir;

fn config(dir: &TempDir) -> RagConfig {
    RagConfig {
        persist_directory: dir.path().join("persist"),
        persist: true,
        chunk_size: 60,
        ..RagConfig::default()
    }
}

fn corpus() -> Vec<Document> {
    vec![Document::with_source(
        "Kevin is a backend engineer based in Sydney.\n\nKevin has seven years of Rust experience.\n\nKevin enjoys rock climbing on weekends.",
        "memory://bucket/text_files/Kevin_resume.txt",
    )]
}

#[tokio::test]
async fn test_directory_layout_and_manifest() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let builder = IndexBuilder::new(Arc::new(HashingEmbedder::new(128).unwrap()), &config);

    let index = builder.build(&corpus(), true).await.unwrap();

    let root = dir.path().join("persist");
    assert!(root.join(persistence::MANIFEST_FILE).is_file());
    assert!(root.join(persistence::CHUNKS_FILE).is_file());

    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(root.join(persistence::MANIFEST_FILE)).unwrap())
            .unwrap();
    assert_eq!(manifest["embeddingModel"], "offline-hashing-128");
    assert_eq!(manifest["dimensions"], 128);
    assert_eq!(manifest["chunkCount"], index.len());

    // No staging directories are left next to the index
    let siblings: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(siblings.len(), 1);
}

#[tokio::test]
async fn test_restarted_builder_reuses_chunks_and_sources() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let first = IndexBuilder::new(Arc::new(HashingEmbedder::new(128).unwrap()), &config);
    let built = first.build(&corpus(), true).await.unwrap();

    let second = IndexBuilder::new(Arc::new(HashingEmbedder::new(128).unwrap()), &config);
    let loaded = second.build(&[], true).await.unwrap();

    assert_eq!(loaded.chunks(), built.chunks());
    assert_eq!(
        loaded.chunks()[0].metadata["source"],
        "memory://bucket/text_files/Kevin_resume.txt"
    );
    assert_eq!(second.stats().embedded_chunks, 0);
    assert_eq!(second.stats().persisted_reuses, 1);

    let embedder = HashingEmbedder::new(128).unwrap();
    let hits = loaded
        .retrieve(&embedder.embed("Kevin rock climbing weekends"), 1)
        .unwrap();
    assert!(hits[0].chunk.text.contains("climbing"));
}

#[tokio::test]
async fn test_concurrent_persisted_builds_leave_one_valid_index() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let a = Arc::new(IndexBuilder::new(Arc::new(HashingEmbedder::new(64).unwrap()), &config));
    let b = Arc::new(IndexBuilder::new(Arc::new(HashingEmbedder::new(64).unwrap()), &config));

    let docs = corpus();
    let (left, right) = tokio::join!(a.build(&docs, true), b.build(&docs, true));
    assert_eq!(left.unwrap().len(), right.unwrap().len());

    let reader = IndexBuilder::new(Arc::new(HashingEmbedder::new(64).unwrap()), &config);
    let loaded = reader.load_persisted().await.unwrap().unwrap();
    assert!(!loaded.is_empty());
}

#[tokio::test]
async fn test_switching_embedder_requires_reset() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    IndexBuilder::new(Arc::new(HashingEmbedder::new(64).unwrap()), &config)
        .build(&corpus(), true)
        .await
        .unwrap();

    let other = IndexBuilder::new(Arc::new(HashingEmbedder::new(256).unwrap()), &config);
    let err = other.build(&corpus(), true).await.unwrap_err();
    assert!(matches!(err, RagError::IndexPersistence(_)));

    assert!(other.reset_persisted().await.unwrap());
    let rebuilt = other.build(&corpus(), true).await.unwrap();
    assert_eq!(rebuilt.dimensions(), 256);
}
