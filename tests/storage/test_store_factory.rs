// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use pdf_rag_node::{
    config::{ServiceConfig, StorageBackend},
    storage::{create_text_store, S3TextStore, StorageError},
};
use std::collections::HashMap;
use tempfile::TempDir;

fn config_from(vars: &[(&str, &str)]) -> ServiceConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ServiceConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

#[tokio::test]
async fn test_local_backend_from_environment() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_str().unwrap();
    let config = config_from(&[("STORAGE_BACKEND", "local"), ("LOCAL_STORE_DIR", root)]);
    assert_eq!(config.storage.backend, StorageBackend::Local);

    let store = create_text_store(&config.storage).await.unwrap();
    assert_eq!(store.backend_name(), "local");

    let ack = store
        .write("bucket", "text_files/resume.txt", "first")
        .await
        .unwrap();
    store
        .write("bucket", "text_files/resume.txt", "second")
        .await
        .unwrap();

    assert!(ack.uri.starts_with("file://"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("bucket/text_files/resume.txt")).unwrap(),
        "second"
    );
    assert_eq!(
        store.read("bucket", "text_files/resume.txt").await.unwrap(),
        "second"
    );
}

#[tokio::test]
async fn test_missing_object_and_bad_keys() {
    let dir = TempDir::new().unwrap();
    let config = config_from(&[
        ("STORAGE_BACKEND", "local"),
        ("LOCAL_STORE_DIR", dir.path().to_str().unwrap()),
    ]);
    let store = create_text_store(&config.storage).await.unwrap();

    assert!(matches!(
        store.read("bucket", "text_files/missing.txt").await,
        Err(StorageError::NotFound(_))
    ));
    assert!(!store.exists("bucket", "text_files/missing.txt").await.unwrap());
    assert!(matches!(
        store.write("bucket", "../escape.txt", "x").await,
        Err(StorageError::InvalidKey(_))
    ));
}

#[tokio::test]
async fn test_s3_backend_is_default() {
    let config = config_from(&[]);
    assert_eq!(config.storage.backend, StorageBackend::S3);
    assert_eq!(
        create_text_store(&config.storage).await.unwrap().uri(&config.rag.bucket, "k.txt"),
        format!("s3://{}/k.txt", config.rag.bucket)
    );
}

#[tokio::test]
async fn test_s3_credentials_from_shared_credentials_file() {
    let dir = TempDir::new().unwrap();
    let credentials_file = dir.path().join("credentials");
    std::fs::write(
        &credentials_file,
        "[default]\naws_access_key_id = AKIDSHARED\naws_secret_access_key = shared-secret\n",
    )
    .unwrap();

    let config = config_from(&[
        ("AWS_SHARED_CREDENTIALS_FILE", credentials_file.to_str().unwrap()),
        ("AWS_PROFILE", "default"),
    ]);
    let store = S3TextStore::new(&config.storage).await.unwrap();

    let credentials = store.resolve_credentials().await.unwrap();
    assert_eq!(credentials.access_key_id(), "AKIDSHARED");
    assert_eq!(credentials.secret_access_key(), "shared-secret");
}
