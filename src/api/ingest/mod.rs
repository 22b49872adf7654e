// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! PDF ingestion endpoint
//!
//! POST /process_new_pdf accepts a multipart upload in the `pdf` field,
//! extracts its text and stores it as a text blob.

pub mod handler;
pub mod response;

pub use handler::process_new_pdf_handler;
pub use response::{FileDetails, IngestResponse};
