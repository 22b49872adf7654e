// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use pdf_rag_node::{api::create_app, storage::MemoryTextStore};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::common::{offline_state, rag_config};

#[tokio::test]
async fn test_health_reports_backend_and_index_state() {
    let store = MemoryTextStore::new();
    let dir = TempDir::new().unwrap();
    let app = create_app(offline_state(&store, &rag_config(dir.path(), true)), 1024);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storageBackend"], "memory");
    assert_eq!(body["indexPersisted"], false);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let store = MemoryTextStore::new();
    let dir = TempDir::new().unwrap();
    let app = create_app(offline_state(&store, &rag_config(dir.path(), false)), 1024);

    let response = app
        .oneshot(Request::builder().uri("/v1/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
