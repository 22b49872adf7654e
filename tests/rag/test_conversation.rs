// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Multi-turn questions through `respond`

use pdf_rag_node::{
    rag::{ChatTurn, QueryOutcome},
    storage::{MemoryTextStore, StorageError},
    TextStore,
};
use tempfile::TempDir;

use crate::common::{offline_state, rag_config, BUCKET, CORPUS_KEY, RESUME_PAGES};

#[tokio::test]
async fn test_follow_up_question_uses_history() {
    let store = MemoryTextStore::new();
    store
        .write(BUCKET, CORPUS_KEY, &RESUME_PAGES.join("\n"))
        .await
        .unwrap();
    let dir = TempDir::new().unwrap();
    let state = offline_state(&store, &rag_config(dir.path(), false));

    let history = vec![ChatTurn {
        question: "Who is Kevin Nguyen?".to_string(),
        answer: "Kevin Nguyen is a backend engineer based in Sydney".to_string(),
    }];

    let outcome = state
        .query_handler
        .respond("Where did Kevin study computer science?", &history)
        .await;

    match outcome {
        QueryOutcome::Answer(answer) => {
            assert!(answer.contains("University of New South Wales"), "{}", answer)
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_respond_reports_store_failures() {
    let store = MemoryTextStore::new();
    store
        .write(BUCKET, CORPUS_KEY, &RESUME_PAGES.join("\n"))
        .await
        .unwrap();
    store
        .inject_error(StorageError::AccessDenied("credentials expired".to_string()))
        .await;
    let dir = TempDir::new().unwrap();
    let state = offline_state(&store, &rag_config(dir.path(), false));

    match state.query_handler.respond("Where is Kevin based?", &[]).await {
        QueryOutcome::Failed(message) => assert!(message.contains("credentials expired")),
        other => panic!("unexpected outcome {:?}", other),
    }

    let serialized = serde_json::to_value(
        state.query_handler.respond("exit", &[]).await,
    )
    .unwrap();
    assert_eq!(serialized, serde_json::json!({"error": "Query to exit received."}));
}
