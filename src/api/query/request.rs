// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Query request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

pub const NO_TEXT_MESSAGE: &str = "No text provided";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl QueryRequest {
    /// The query text, rejecting missing and empty values
    pub fn validate(&self) -> Result<&str, ApiError> {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => Ok(query),
            _ => Err(ApiError::validation("query", NO_TEXT_MESSAGE)),
        }
    }
}
