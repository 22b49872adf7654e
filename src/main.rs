// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use pdf_rag_node::{api::start_server, config::ServiceConfig};
use std::env;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting PDF RAG Node...\n");
    println!("📦 BUILD VERSION: {}", pdf_rag_node::version::VERSION);
    println!("📅 Build Date: {}", pdf_rag_node::version::BUILD_DATE);
    println!();

    let config = ServiceConfig::from_env().context("Failed to read configuration")?;
    config.validate().context("Invalid configuration")?;

    println!("🗄️  Storage backend: {}", config.storage.backend.as_str());
    println!("🪣 Bucket: {}", config.rag.bucket);
    println!("📄 Corpus key: {}", config.rag.default_corpus_key);
    if config.rag.persist {
        println!("💾 Persisting index under {:?}", config.rag.persist_directory);
    } else {
        println!("💾 Index persistence DISABLED (set INDEX_PERSIST=true to enable)");
    }
    println!("🌐 Listening on {}:{}", config.api.host, config.api.port);
    println!();

    tokio::select! {
        result = start_server(config) => {
            result.map_err(|e| anyhow!("API server failed: {}", e))?;
        }
        _ = signal::ctrl_c() => {
            println!("\n⏹️  Shutting down...");
        }
    }

    Ok(())
}
