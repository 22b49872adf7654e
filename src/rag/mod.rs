// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) pipeline
// Corpus retrieval, conversational chain and query state handling

pub mod chain;
pub mod errors;
pub mod query_handler;

pub use chain::{ChainOutput, ChatTurn, ConversationalRetrievalChain};
pub use errors::RagError;
pub use query_handler::{is_exit_query, QueryHandler, QueryOutcome, EXIT_MESSAGE};
