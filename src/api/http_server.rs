// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::ingest::process_new_pdf_handler;
use super::query::handle_new_query_handler;
use crate::config::ServiceConfig;
use crate::embeddings::create_embedder;
use crate::ingestion::DocumentIngestor;
use crate::llm::create_chat_model;
use crate::rag::{ConversationalRetrievalChain, QueryHandler};
use crate::storage::create_text_store;
use crate::vector::IndexBuilder;

#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<DocumentIngestor>,
    pub query_handler: Arc<QueryHandler>,
    pub storage_backend: String,
}

impl AppState {
    /// Wire store, models, index builder and handlers from configuration
    pub async fn from_config(
        config: &ServiceConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let store = create_text_store(&config.storage).await?;
        let embedder = create_embedder(&config.models)?;
        let chat_model = create_chat_model(&config.models)?;

        tracing::info!(
            "Models: embeddings={} chat={}",
            embedder.model_name(),
            chat_model.model_name()
        );

        let builder = Arc::new(IndexBuilder::new(embedder.clone(), &config.rag));
        let chain = ConversationalRetrievalChain::new(embedder, chat_model, config.rag.top_k);

        Ok(Self {
            ingestor: Arc::new(DocumentIngestor::new(store.clone(), &config.rag)),
            storage_backend: store.backend_name().to_string(),
            query_handler: Arc::new(QueryHandler::new(
                store,
                builder,
                chain,
                config.rag.clone(),
            )),
        })
    }
}

pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/process_new_pdf", post(process_new_pdf_handler))
        .route("/handle_new_query", post(handle_new_query_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState::from_config(&config).await?;
    let app = create_app(state, config.api.max_upload_bytes);

    let addr = config.api.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::version::VERSION_NUMBER,
        "storageBackend": state.storage_backend,
        "indexPersisted": state.query_handler.builder().has_persisted(),
    }))
}
