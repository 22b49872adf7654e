// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ingestion response types

use serde::{Deserialize, Serialize};

use crate::ingestion::IngestionRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDetails {
    #[serde(rename = "Filename")]
    pub filename: String,
    /// Size of the uploaded PDF in bytes
    #[serde(rename = "File size")]
    pub file_size: usize,
    #[serde(rename = "S3 URI")]
    pub storage_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub file_details: FileDetails,
}

impl From<IngestionRecord> for IngestResponse {
    fn from(record: IngestionRecord) -> Self {
        Self {
            message: record.confirmation_message(),
            file_details: FileDetails {
                filename: record.filename,
                file_size: record.byte_size,
                storage_uri: record.storage_uri,
            },
        }
    }
}
