// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use pdf_rag_node::{
    config::RagConfig,
    ingestion::{pdf::extract_text, DocumentIngestor},
    storage::{LocalTextStore, MemoryTextStore, StorageError, TextStore},
    RagError,
};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{build_pdf, RESUME_PAGES};

fn ingestor(root: &TempDir) -> DocumentIngestor {
    let config = RagConfig {
        bucket: "uploads".to_string(),
        ..RagConfig::default()
    };
    DocumentIngestor::new(Arc::new(LocalTextStore::new(root.path())), &config)
}

#[tokio::test]
async fn test_pages_are_extracted_in_order() {
    let text = extract_text(build_pdf(&RESUME_PAGES)).await.unwrap();

    let first = text.find("Sydney").unwrap();
    let second = text.find("seven years").unwrap();
    let third = text.find("New South Wales").unwrap();
    assert!(first < second && second < third);
}

#[tokio::test]
async fn test_ingest_writes_under_text_files_prefix() {
    let root = TempDir::new().unwrap();
    let pdf = build_pdf(&RESUME_PAGES);

    let record = ingestor(&root)
        .ingest(&pdf, "Kevin_resume.pdf")
        .await
        .unwrap();

    let path = root.path().join("uploads/text_files/Kevin_resume.txt");
    assert_eq!(record.text_key, "text_files/Kevin_resume.txt");
    assert_eq!(record.byte_size, pdf.len());
    assert_eq!(record.storage_uri, format!("file://{}", path.display()));
    assert!(std::fs::read_to_string(path)
        .unwrap()
        .contains("payment systems in Rust"));
}

#[tokio::test]
async fn test_client_directories_are_stripped_from_key() {
    let root = TempDir::new().unwrap();
    let record = ingestor(&root)
        .ingest(&build_pdf(&["Cover letter"]), "C:\\Users\\kevin\\cover.letter.pdf")
        .await
        .unwrap();

    assert_eq!(record.text_key, "text_files/cover.letter.txt");
    assert!(root.path().join("uploads/text_files/cover.letter.txt").is_file());
}

#[tokio::test]
async fn test_uppercase_extension_is_rejected() {
    let root = TempDir::new().unwrap();
    let err = ingestor(&root)
        .ingest(&build_pdf(&["x"]), "RESUME.PDF")
        .await
        .unwrap_err();

    assert_eq!(err, RagError::Validation("File is not a PDF.".to_string()));
    assert!(!root.path().join("uploads").exists());
}

#[tokio::test]
async fn test_ingest_into_memory_store() {
    let store = MemoryTextStore::new();
    let config = RagConfig {
        bucket: "docs".to_string(),
        ..RagConfig::default()
    };
    let ingestor = DocumentIngestor::new(Arc::new(store.clone()), &config);
    let pdf = build_pdf(&["Ten years of systems programming"]);

    let record = ingestor.ingest(&pdf, "resume.pdf").await.unwrap();

    assert_eq!(record.filename, "resume.pdf");
    assert_eq!(record.storage_uri, "memory://docs/text_files/resume.txt");
    assert!(record.confirmation_message().contains("resume.pdf"));
    assert!(store
        .read("docs", "text_files/resume.txt")
        .await
        .unwrap()
        .contains("Ten years of systems programming"));
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let store = MemoryTextStore::new();
    store
        .inject_error(StorageError::AccessDenied("memory://docs".to_string()))
        .await;
    let ingestor = DocumentIngestor::new(Arc::new(store.clone()), &RagConfig::default());

    let err = ingestor
        .ingest(&build_pdf(&["text"]), "cv.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::AccessDenied(_)));
}
