// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat completions client for an OpenAI-compatible API

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info};

use super::{ChatMessage, ChatModel};
use crate::config::ModelConfig;
use crate::rag::RagError;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct OpenAiChatModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model_name: String,
    temperature: f32,
}

impl OpenAiChatModel {
    pub fn new(config: &ModelConfig) -> Result<Self, RagError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RagError::ModelInvocation("OPENAI_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::ModelInvocation(e.to_string()))?;

        let endpoint = config.base_url.trim_end_matches('/').to_string();
        info!(
            "Chat client configured: endpoint={}, model={}",
            endpoint, config.chat_model
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
            model_name: config.chat_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, RagError> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model_name,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::ModelInvocation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::ModelInvocation(format!(
                "chat endpoint returned {}: {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagError::ModelInvocation(format!("invalid response: {}", e)))?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RagError::ModelInvocation("response had no choices".to_string()))?;

        debug!(
            "Chat completion in {}ms ({} tokens)",
            start.elapsed().as_millis(),
            chat_response.usage.map(|u| u.total_tokens).unwrap_or(0)
        );

        Ok(text)
    }
}
