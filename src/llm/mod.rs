// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat completion backends used by the retrieval chain

pub mod extractive;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{ModelBackend, ModelConfig};
use crate::rag::RagError;

pub use extractive::ExtractiveChatModel;
pub use openai::OpenAiChatModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Run one completion over `messages` and return the assistant text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, RagError>;
}

/// Build the chat model selected by `MODEL_BACKEND`
pub fn create_chat_model(config: &ModelConfig) -> Result<Arc<dyn ChatModel>, RagError> {
    match config.backend {
        ModelBackend::OpenAi => Ok(Arc::new(OpenAiChatModel::new(config)?)),
        ModelBackend::Offline => Ok(Arc::new(ExtractiveChatModel::new())),
    }
}
