// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Offline chat backend
//!
//! Answers by quoting the context sentence that shares the most words with
//! the question. Condense requests are answered with the follow-up question
//! unchanged.

use async_trait::async_trait;
use std::collections::HashSet;

use super::{ChatMessage, ChatModel, Role};
use crate::rag::chain::{CONTEXT_SEPARATOR, FOLLOW_UP_MARKER, STANDALONE_MARKER};
use crate::rag::RagError;

pub const UNKNOWN_ANSWER: &str = "I don't know.";

#[derive(Debug, Clone, Default)]
pub struct ExtractiveChatModel;

impl ExtractiveChatModel {
    pub fn new() -> Self {
        Self
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

fn follow_up_question(prompt: &str) -> Option<&str> {
    let start = prompt.find(FOLLOW_UP_MARKER)? + FOLLOW_UP_MARKER.len();
    let rest = &prompt[start..];
    let end = rest.find(STANDALONE_MARKER).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn best_sentence<'a>(context: &'a str, question: &str) -> Option<&'a str> {
    let question_words = words(question);
    let mut best: Option<(usize, &'a str)> = None;

    for sentence in context
        .split(|c: char| matches!(c, '.' | '!' | '?' | '\n'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let score = words(sentence).intersection(&question_words).count();
        // first sentence wins ties
        if score > 0 && best.map_or(true, |(top, _)| score > top) {
            best = Some((score, sentence));
        }
    }

    best.map(|(_, sentence)| sentence)
}

#[async_trait]
impl ChatModel for ExtractiveChatModel {
    fn model_name(&self) -> &str {
        "offline-extractive"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, RagError> {
        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .ok_or_else(|| RagError::ModelInvocation("no user message".to_string()))?;

        if let Some(follow_up) = follow_up_question(question) {
            return Ok(follow_up.to_string());
        }

        let context = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| match m.content.rfind(CONTEXT_SEPARATOR) {
                Some(idx) => &m.content[idx + CONTEXT_SEPARATOR.len()..],
                None => m.content.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(best_sentence(&context, question)
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_ANSWER.to_string()))
    }
}
