// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Transient storage failure: {0}")]
    Transient(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Stored object is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("I/O error: {0}")]
    Io(String),
}

impl StorageError {
    /// Network-level and server-side failures; nothing in this crate
    /// retries them, callers only use this for reporting.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

/// Acknowledgement of a successful write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteAck {
    pub uri: String,
    pub bytes_written: usize,
}

/// Bucket/key addressed text blob storage.
///
/// Writes overwrite unconditionally (last write wins). No implementation
/// retries failed requests.
#[async_trait]
pub trait TextStore: Send + Sync {
    async fn read(&self, bucket: &str, key: &str) -> Result<String, StorageError>;
    async fn write(&self, bucket: &str, key: &str, text: &str) -> Result<WriteAck, StorageError>;
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;
    /// Human readable location of an object, e.g. `s3://bucket/key`
    fn uri(&self, bucket: &str, key: &str) -> String;
    fn backend_name(&self) -> &'static str;
}

/// Reject keys that could escape the bucket namespace on any backend.
pub fn validate_location(bucket: &str, key: &str) -> Result<(), StorageError> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(StorageError::InvalidKey(format!("invalid bucket '{}'", bucket)));
    }

    if key.is_empty() {
        return Err(StorageError::InvalidKey("Empty key".to_string()));
    }

    if key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Key cannot start with /".to_string(),
        ));
    }

    if key.contains('\\') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Path traversal not allowed".to_string(),
        ));
    }

    Ok(())
}

/// In-process store used by tests and the `memory` backend
#[derive(Debug, Clone, Default)]
pub struct MemoryTextStore {
    objects: Arc<Mutex<HashMap<(String, String), String>>>,
    injected_error: Arc<Mutex<Option<StorageError>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next store operation with `error`
    pub async fn inject_error(&self, error: StorageError) {
        *self.injected_error.lock().await = Some(error);
    }

    /// Number of `read` calls made against this store (including failed ones)
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }

    async fn check_injected_error(&self) -> Result<(), StorageError> {
        let mut error_opt = self.injected_error.lock().await;
        if let Some(error) = error_opt.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl TextStore for MemoryTextStore {
    async fn read(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_injected_error().await?;
        validate_location(bucket, key)?;

        let objects = self.objects.lock().await;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(self.uri(bucket, key)))
    }

    async fn write(&self, bucket: &str, key: &str, text: &str) -> Result<WriteAck, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_injected_error().await?;
        validate_location(bucket, key)?;

        let mut objects = self.objects.lock().await;
        objects.insert((bucket.to_string(), key.to_string()), text.to_string());

        Ok(WriteAck {
            uri: self.uri(bucket, key),
            bytes_written: text.len(),
        })
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        self.check_injected_error().await?;
        validate_location(bucket, key)?;

        let objects = self.objects.lock().await;
        Ok(objects.contains_key(&(bucket.to_string(), key.to_string())))
    }

    fn uri(&self, bucket: &str, key: &str) -> String {
        format!("memory://{}/{}", bucket, key)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
