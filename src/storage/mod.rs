// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod local_store;
pub mod s3_store;
pub mod text_store;

use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

// Re-export main types for convenience
pub use local_store::LocalTextStore;
pub use s3_store::S3TextStore;
pub use text_store::{validate_location, MemoryTextStore, StorageError, TextStore, WriteAck};

/// Build the text store selected by `STORAGE_BACKEND`
pub async fn create_text_store(
    config: &StorageConfig,
) -> Result<Arc<dyn TextStore>, StorageError> {
    let store: Arc<dyn TextStore> = match config.backend {
        StorageBackend::S3 => Arc::new(S3TextStore::new(config).await?),
        StorageBackend::Local => Arc::new(LocalTextStore::new(config.local_root.clone())),
        StorageBackend::Memory => Arc::new(MemoryTextStore::new()),
    };

    info!("Text store backend: {}", store.backend_name());
    Ok(store)
}
