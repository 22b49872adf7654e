// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Upload a PDF, then answer questions from the text it produced

use pdf_rag_node::{rag::QueryOutcome, storage::MemoryTextStore, RagError, TextStore};
use tempfile::TempDir;

use crate::common::{build_pdf, offline_state, rag_config, BUCKET, CORPUS_KEY, RESUME_PAGES};

#[tokio::test]
async fn test_uploaded_resume_becomes_the_corpus() {
    let store = MemoryTextStore::new();
    let dir = TempDir::new().unwrap();
    let state = offline_state(&store, &rag_config(dir.path(), false));

    let record = state
        .ingestor
        .ingest(&build_pdf(&RESUME_PAGES), "resume.pdf")
        .await
        .unwrap();
    assert_eq!(record.text_key, CORPUS_KEY);
    assert!(store.exists(BUCKET, CORPUS_KEY).await.unwrap());

    let outcome = state
        .query_handler
        .handle("How many years did Kevin spend building payment systems?")
        .await
        .unwrap();

    match outcome {
        QueryOutcome::Answer(answer) => assert!(answer.contains("seven years"), "{}", answer),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_other_uploads_do_not_change_the_corpus() {
    let store = MemoryTextStore::new();
    let dir = TempDir::new().unwrap();
    let state = offline_state(&store, &rag_config(dir.path(), false));

    state
        .ingestor
        .ingest(&build_pdf(&["Quarterly report for the sales team."]), "report.pdf")
        .await
        .unwrap();

    let err = state
        .query_handler
        .handle("What is in the report?")
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::NotFound(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_persisted_index_survives_corpus_changes_until_reset() {
    let store = MemoryTextStore::new();
    let dir = TempDir::new().unwrap();
    let config = rag_config(dir.path(), true);
    let state = offline_state(&store, &config);

    store
        .write(BUCKET, CORPUS_KEY, "Kevin lives in Sydney.")
        .await
        .unwrap();
    state.query_handler.handle("Where does Kevin live?").await.unwrap();

    store
        .write(BUCKET, CORPUS_KEY, "Kevin moved to Melbourne.")
        .await
        .unwrap();

    // A second pipeline over the same directory behaves like a restarted process
    let restarted = offline_state(&store, &config);
    let stale = restarted
        .query_handler
        .handle("Where does Kevin live?")
        .await
        .unwrap();
    assert_eq!(stale, QueryOutcome::Answer("Kevin lives in Sydney".to_string()));
    assert_eq!(restarted.query_handler.builder().stats().persisted_reuses, 1);

    assert!(restarted.query_handler.builder().reset_persisted().await.unwrap());
    let fresh = restarted
        .query_handler
        .handle("Where did Kevin move?")
        .await
        .unwrap();
    assert_eq!(fresh, QueryOutcome::Answer("Kevin moved to Melbourne".to_string()));
    assert_eq!(restarted.query_handler.builder().stats().fresh_builds, 1);
}
