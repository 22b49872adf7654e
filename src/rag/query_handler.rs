// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval-augmented query handling
//!
//! One query moves through: exit check, index acquisition (persisted reuse
//! or corpus fetch + build), retrieval and generation. Exit tokens stop the
//! query before any store, embedding or model call.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::chain::{ChatTurn, ConversationalRetrievalChain};
use super::RagError;
use crate::config::RagConfig;
use crate::storage::TextStore;
use crate::vector::{Document, IndexBuilder, VectorIndex};

pub const EXIT_TOKENS: [&str; 3] = ["quit", "q", "exit"];
pub const EXIT_MESSAGE: &str = "Query to exit received.";

/// Result of one query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Serialized as `{"answer": ...}`
    Answer(String),
    /// Serialized as `{"error": "Query to exit received."}`
    ExitRequested,
    /// Serialized as `{"error": ...}`; only produced by `respond`
    Failed(String),
}

impl Serialize for QueryOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            QueryOutcome::Answer(answer) => map.serialize_entry("answer", answer)?,
            QueryOutcome::ExitRequested => map.serialize_entry("error", EXIT_MESSAGE)?,
            QueryOutcome::Failed(message) => map.serialize_entry("error", message)?,
        }
        map.end()
    }
}

pub fn is_exit_query(query: &str) -> bool {
    let normalized = query.trim().to_lowercase();
    EXIT_TOKENS.contains(&normalized.as_str())
}

pub struct QueryHandler {
    store: Arc<dyn TextStore>,
    builder: Arc<IndexBuilder>,
    chain: ConversationalRetrievalChain,
    config: RagConfig,
}

impl QueryHandler {
    pub fn new(
        store: Arc<dyn TextStore>,
        builder: Arc<IndexBuilder>,
        chain: ConversationalRetrievalChain,
        config: RagConfig,
    ) -> Self {
        Self {
            store,
            builder,
            chain,
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn builder(&self) -> &Arc<IndexBuilder> {
        &self.builder
    }

    /// Answer a single stateless query
    pub async fn handle(&self, query: &str) -> Result<QueryOutcome, RagError> {
        self.handle_with_history(query, &[]).await
    }

    pub async fn handle_with_history(
        &self,
        query: &str,
        history: &[ChatTurn],
    ) -> Result<QueryOutcome, RagError> {
        if is_exit_query(query) {
            info!("Exit token received, skipping retrieval");
            return Ok(QueryOutcome::ExitRequested);
        }

        if query.is_empty() {
            return Err(RagError::Validation("No text provided".to_string()));
        }

        let index = self.acquire_index().await?;
        let output = self.chain.run(&index, query, history).await?;
        debug!(
            "Answered from {} chunks of {}",
            output.source_chunks.len(),
            index.len()
        );

        Ok(QueryOutcome::Answer(output.answer))
    }

    /// Like `handle`, but failures are reported as `QueryOutcome::Failed`
    pub async fn respond(&self, query: &str, history: &[ChatTurn]) -> QueryOutcome {
        match self.handle_with_history(query, history).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Query failed [{}]: {}", e.error_code(), e);
                QueryOutcome::Failed(e.to_string())
            }
        }
    }

    async fn acquire_index(&self) -> Result<VectorIndex, RagError> {
        if self.config.persist {
            if let Some(index) = self.builder.load_persisted().await? {
                return Ok(index);
            }
        }

        let corpus = self.load_corpus().await?;
        self.builder.build(&corpus, self.config.persist).await
    }

    async fn load_corpus(&self) -> Result<Vec<Document>, RagError> {
        let bucket = &self.config.bucket;
        let key = &self.config.default_corpus_key;

        let text = self.store.read(bucket, key).await?;
        debug!("Loaded corpus {} ({} chars)", key, text.len());

        Ok(vec![Document::with_source(text, self.store.uri(bucket, key))])
    }
}
