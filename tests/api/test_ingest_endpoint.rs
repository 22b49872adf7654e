// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /process_new_pdf through the full router

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use pdf_rag_node::{api::create_app, storage::MemoryTextStore, TextStore};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::common::{build_pdf, multipart_body, offline_state, rag_config, BUCKET, RESUME_PAGES};

const BOUNDARY: &str = "pdf-rag-test-boundary";
const MAX_UPLOAD: usize = 1024 * 1024;

fn upload_request(field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process_new_pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(BOUNDARY, field, filename, bytes)))
        .unwrap()
}

async fn send(store: &MemoryTextStore, request: Request<Body>) -> (StatusCode, Value) {
    let dir = TempDir::new().unwrap();
    let app = create_app(offline_state(store, &rag_config(dir.path(), false)), MAX_UPLOAD);

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_upload_stores_text_blob() {
    let store = MemoryTextStore::new();
    let pdf = build_pdf(&RESUME_PAGES);

    let (status, body) = send(&store, upload_request("pdf", "resume.pdf", &pdf)).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["file_details"]["Filename"], "resume.pdf");
    assert_eq!(body["file_details"]["File size"], pdf.len());
    assert_eq!(
        body["file_details"]["S3 URI"],
        format!("memory://{}/text_files/resume.txt", BUCKET)
    );
    assert_eq!(
        body["message"],
        format!(
            "File 'resume.pdf' processed successfully and saved to 'memory://{}/text_files/resume.txt'.",
            BUCKET
        )
    );

    let text = store.read(BUCKET, "text_files/resume.txt").await.unwrap();
    assert!(text.contains("backend engineer based in Sydney"));
    assert!(text.contains("University of New South Wales"));
}

#[tokio::test]
async fn test_reupload_overwrites_previous_text() {
    let store = MemoryTextStore::new();

    let first = build_pdf(&["First version of the resume."]);
    let second = build_pdf(&["Second version of the resume."]);
    send(&store, upload_request("pdf", "resume.pdf", &first)).await;
    let (status, _) = send(&store, upload_request("pdf", "resume.pdf", &second)).await;

    assert_eq!(status, StatusCode::OK);
    let text = store.read(BUCKET, "text_files/resume.txt").await.unwrap();
    assert!(text.contains("Second version"));
    assert!(!text.contains("First version"));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_missing_pdf_field_is_rejected() {
    let store = MemoryTextStore::new();
    let pdf = build_pdf(&RESUME_PAGES);

    let (status, body) = send(&store, upload_request("document", "resume.pdf", &pdf)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No PDF file provided");
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let store = MemoryTextStore::new();
    let request = Request::builder()
        .method("POST")
        .uri("/process_new_pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"pdf": "resume.pdf"}"#))
        .unwrap();

    let (status, body) = send(&store, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No PDF file provided");
}

#[tokio::test]
async fn test_non_pdf_filename_is_rejected() {
    let store = MemoryTextStore::new();

    let (status, body) = send(&store, upload_request("pdf", "notes.txt", b"plain text")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File is not a PDF.");
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_corrupt_pdf_is_internal_error() {
    let store = MemoryTextStore::new();

    let (status, body) =
        send(&store, upload_request("pdf", "broken.pdf", b"this is not a pdf")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process file");
    assert_eq!(store.write_count(), 0);
}
