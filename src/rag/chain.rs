// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversational retrieval chain
//!
//! 1. With prior turns, ask the model to rewrite the question as a
//!    standalone question. Without history the question is used as is.
//! 2. Embed the (standalone) question and retrieve the top-k chunks.
//! 3. "Stuff" all retrieved chunk texts into one system prompt and ask the
//!    model the question.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::embeddings::Embedder;
use crate::llm::{ChatMessage, ChatModel};
use crate::rag::RagError;
use crate::vector::{RetrievedChunk, VectorIndex};

pub const CONTEXT_SEPARATOR: &str = "----------------\n";
pub const FOLLOW_UP_MARKER: &str = "Follow Up Input: ";
pub const STANDALONE_MARKER: &str = "Standalone question:";

const QA_SYSTEM_PREFIX: &str = "Use the following pieces of context to answer the user's question. \nIf you don't know the answer, just say that you don't know, don't try to make up an answer.\n";
const CONDENSE_PREFIX: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.\n\nChat History:";

/// One completed question/answer exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub answer: String,
    /// Question actually used for retrieval
    pub standalone_question: String,
    pub source_chunks: Vec<RetrievedChunk>,
}

pub fn format_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("\nHuman: {}\nAssistant: {}", turn.question, turn.answer))
        .collect()
}

pub fn condense_prompt(question: &str, history: &[ChatTurn]) -> String {
    format!(
        "{}{}\n{}{}\n{}",
        CONDENSE_PREFIX,
        format_history(history),
        FOLLOW_UP_MARKER,
        question,
        STANDALONE_MARKER
    )
}

/// System + user messages with every retrieved chunk joined into the context
pub fn stuff_messages(question: &str, chunks: &[RetrievedChunk]) -> Vec<ChatMessage> {
    let context = chunks
        .iter()
        .map(|c| c.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(format!("{}{}{}", QA_SYSTEM_PREFIX, CONTEXT_SEPARATOR, context)),
        ChatMessage::user(question),
    ]
}

pub struct ConversationalRetrievalChain {
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
}

impl ConversationalRetrievalChain {
    pub fn new(embedder: Arc<dyn Embedder>, model: Arc<dyn ChatModel>, top_k: usize) -> Self {
        Self {
            embedder,
            model,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn run(
        &self,
        index: &VectorIndex,
        question: &str,
        history: &[ChatTurn],
    ) -> Result<ChainOutput, RagError> {
        let standalone_question = if history.is_empty() {
            question.to_string()
        } else {
            let rewritten = self
                .model
                .complete(&[ChatMessage::user(condense_prompt(question, history))])
                .await?;
            debug!("Condensed follow-up question to: {}", rewritten);
            rewritten.trim().to_string()
        };

        let query_vector = self.embedder.embed_query(&standalone_question).await?;
        let source_chunks = index.retrieve(&query_vector, self.top_k)?;
        debug!(
            "Retrieved {} chunks (best score {:?})",
            source_chunks.len(),
            source_chunks.first().map(|c| c.score)
        );

        let answer = self
            .model
            .complete(&stuff_messages(&standalone_question, &source_chunks))
            .await?;

        Ok(ChainOutput {
            answer,
            standalone_question,
            source_chunks,
        })
    }
}
