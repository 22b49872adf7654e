// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::text_store::{validate_location, StorageError, TextStore, WriteAck};

/// Text store that keeps objects on local disk at `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct LocalTextStore {
    root: PathBuf,
}

impl LocalTextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_location(bucket, key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

fn map_io_error(err: std::io::Error, location: String) -> StorageError {
    match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound(location),
        ErrorKind::PermissionDenied => StorageError::AccessDenied(location),
        _ => StorageError::Io(format!("{}: {}", location, err)),
    }
}

#[async_trait]
impl TextStore for LocalTextStore {
    async fn read(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        let path = self.object_path(bucket, key)?;
        let bytes = fs::read(&path)
            .await
            .map_err(|e| map_io_error(e, self.uri(bucket, key)))?;

        String::from_utf8(bytes).map_err(|e| StorageError::Encoding(e.to_string()))
    }

    async fn write(&self, bucket: &str, key: &str, text: &str) -> Result<WriteAck, StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(e, self.uri(bucket, key)))?;
        }

        fs::write(&path, text.as_bytes())
            .await
            .map_err(|e| map_io_error(e, self.uri(bucket, key)))?;
        debug!("Wrote {} bytes to {}", text.len(), path.display());

        Ok(WriteAck {
            uri: self.uri(bucket, key),
            bytes_written: text.len(),
        })
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(bucket, key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io_error(e, self.uri(bucket, key))),
        }
    }

    fn uri(&self, bucket: &str, key: &str) -> String {
        format!("file://{}", self.root.join(bucket).join(key).display())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
