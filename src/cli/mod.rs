// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// PDF RAG Node CLI
#[derive(Parser, Debug)]
#[command(name = "pdf-rag-cli")]
#[command(version)]
#[command(about = "Ingest PDFs and ask questions about the stored corpus", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a local PDF and store its text
    Ingest(commands::IngestArgs),

    /// Answer a single question
    Ask(commands::AskArgs),

    /// Interactive question loop (type quit, q or exit to leave)
    Chat(commands::ChatArgs),

    /// Delete the persisted vector index
    ResetIndex,

    /// Show configuration and index state
    Status,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest(args) => commands::ingest(args).await,
        Commands::Ask(args) => commands::ask(args).await,
        Commands::Chat(args) => commands::chat(args).await,
        Commands::ResetIndex => commands::reset_index().await,
        Commands::Status => commands::status().await,
    }
}
