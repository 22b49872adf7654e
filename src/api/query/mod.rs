// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Query endpoint: POST /handle_new_query answers a question from the corpus

pub mod handler;
pub mod request;

pub use handler::handle_new_query_handler;
pub use request::QueryRequest;
