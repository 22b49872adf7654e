// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /handle_new_query through the full router

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use pdf_rag_node::{api::create_app, storage::MemoryTextStore, AppState, TextStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::common::{offline_state, rag_config, BUCKET, CORPUS_KEY, RESUME_PAGES};

async fn seeded_store() -> MemoryTextStore {
    let store = MemoryTextStore::new();
    store
        .write(BUCKET, CORPUS_KEY, &RESUME_PAGES.join("\n"))
        .await
        .unwrap();
    store
}

fn query_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/handle_new_query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn app(state: AppState) -> Router {
    create_app(state, 1024 * 1024)
}

#[tokio::test]
async fn test_query_returns_answer() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let app = app(offline_state(&store, &rag_config(dir.path(), false)));

    let (status, body) = send(
        &app,
        query_request(json!({"query": "Where is Kevin based?"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let answer = body["answer"].as_str().unwrap();
    assert!(!answer.is_empty());
    assert!(answer.contains("Sydney"), "answer was {}", answer);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_exit_token_makes_no_downstream_calls() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let state = offline_state(&store, &rag_config(dir.path(), false));
    let handler = state.query_handler.clone();
    let app = app(state);

    for token in ["quit", "q", "exit", " EXIT "] {
        let (status, body) = send(&app, query_request(json!({ "query": token }).to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "Query to exit received."}));
    }

    assert_eq!(store.read_count(), 0);
    assert_eq!(handler.builder().stats().fresh_builds, 0);
    assert_eq!(handler.builder().stats().embedded_chunks, 0);
}

#[tokio::test]
async fn test_bad_request_bodies() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let app = app(offline_state(&store, &rag_config(dir.path(), false)));

    for body in [
        "{}".to_string(),
        json!({"query": ""}).to_string(),
        json!({"query": 42}).to_string(),
        json!({"query": null}).to_string(),
        "not json".to_string(),
    ] {
        let (status, response) = send(&app, query_request(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response, json!({"error": "No text provided"}));
    }

    assert_eq!(store.read_count(), 0);
}

#[tokio::test]
async fn test_missing_corpus_is_internal_error() {
    let store = MemoryTextStore::new();
    let dir = TempDir::new().unwrap();
    let app = app(offline_state(&store, &rag_config(dir.path(), false)));

    let (status, body) = send(
        &app,
        query_request(json!({"query": "Where is Kevin based?"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to handle query"}));
}

#[tokio::test]
async fn test_persisted_index_is_reused_between_queries() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let state = offline_state(&store, &rag_config(dir.path(), true));
    let handler = state.query_handler.clone();
    let app = app(state);

    for _ in 0..3 {
        let (status, _) = send(
            &app,
            query_request(json!({"query": "What did Kevin study?"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let stats = handler.builder().stats();
    assert_eq!(stats.fresh_builds, 1);
    assert_eq!(stats.persisted_reuses, 2);
    assert_eq!(store.read_count(), 1);
    assert!(handler.builder().has_persisted());
}

#[tokio::test]
async fn test_without_persistence_each_query_re_embeds() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let state = offline_state(&store, &rag_config(dir.path(), false));
    let handler = state.query_handler.clone();
    let app = app(state);

    for _ in 0..2 {
        send(
            &app,
            query_request(json!({"query": "What did Kevin study?"}).to_string()),
        )
        .await;
    }

    let stats = handler.builder().stats();
    assert_eq!(stats.fresh_builds, 2);
    assert_eq!(stats.persisted_reuses, 0);
    assert_eq!(store.read_count(), 2);
    assert!(!handler.builder().has_persisted());
}
