// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod ingestion;
pub mod llm;
pub mod rag;
pub mod storage;
pub mod vector;
pub mod version;

pub use api::{create_app, start_server, ApiError, AppState};
pub use config::{ConfigError, ModelBackend, RagConfig, ServiceConfig, StorageBackend};
pub use embeddings::Embedder;
pub use ingestion::{DocumentIngestor, IngestionRecord};
pub use llm::ChatModel;
pub use rag::{QueryHandler, QueryOutcome, RagError};
pub use storage::{StorageError, TextStore};
pub use vector::{Document, IndexBuilder, VectorIndex};
