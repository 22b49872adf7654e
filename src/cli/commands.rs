// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::api::AppState;
use crate::config::ServiceConfig;
use crate::rag::{ChatTurn, QueryHandler, QueryOutcome};

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Path of the PDF to ingest
    pub path: PathBuf,

    /// Store under this filename instead of the path's file name
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for the ask command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to answer from the corpus
    pub query: String,

    /// Print the outcome as JSON, matching the HTTP response body
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Forget previous turns instead of condensing follow-up questions
    #[arg(long)]
    pub no_history: bool,
}

async fn load_state() -> Result<AppState> {
    dotenv::dotenv().ok();

    let config = ServiceConfig::from_env().context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;

    AppState::from_config(&config)
        .await
        .map_err(|e| anyhow!("Failed to initialise pipeline: {}", e))
}

/// Extract a local PDF and store its text blob
pub async fn ingest(args: IngestArgs) -> Result<()> {
    let state = load_state().await?;

    let filename = match args.name {
        Some(name) => name,
        None => args
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Cannot determine a filename for {:?}", args.path))?,
    };

    let bytes = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read {:?}", args.path))?;

    let record = state.ingestor.ingest(&bytes, &filename).await?;

    println!("✅ {}", record.confirmation_message());
    println!("   Filename:  {}", record.filename);
    println!("   File size: {} bytes", record.byte_size);
    println!("   Text key:  {}", record.text_key);

    Ok(())
}

/// Answer one question
pub async fn ask(args: AskArgs) -> Result<()> {
    let state = load_state().await?;
    let outcome = state.query_handler.respond(&args.query, &[]).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        QueryOutcome::Answer(answer) => println!("{}", answer),
        QueryOutcome::ExitRequested => println!("{}", crate::rag::EXIT_MESSAGE),
        QueryOutcome::Failed(message) => return Err(anyhow!(message)),
    }

    let stats = state.query_handler.builder().stats();
    info!(
        "Index stats: {} fresh builds, {} persisted reuses, {} chunks embedded",
        stats.fresh_builds, stats.persisted_reuses, stats.embedded_chunks
    );

    Ok(())
}

/// Interactive question loop on stdin/stdout
pub async fn chat(args: ChatArgs) -> Result<()> {
    let state = load_state().await?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let turns = run_chat(&state.query_handler, stdin, stdout, !args.no_history).await?;
    info!("Chat ended after {} answered questions", turns.len());

    Ok(())
}

/// Read questions line by line until an exit token or end of input.
///
/// Answered questions become history for follow-up questions when
/// `keep_history` is set. Failures are printed and the loop continues.
pub async fn run_chat<R, W>(
    handler: &QueryHandler,
    reader: R,
    mut writer: W,
    keep_history: bool,
) -> Result<Vec<ChatTurn>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut history: Vec<ChatTurn> = Vec::new();
    let mut lines = reader.lines();

    writer.write_all(b"> ").await?;
    writer.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            writer.write_all(b"> ").await?;
            writer.flush().await?;
            continue;
        }

        let context: &[ChatTurn] = if keep_history { &history } else { &[] };
        match handler.respond(question, context).await {
            QueryOutcome::Answer(answer) => {
                writer.write_all(format!("{}\n", answer).as_bytes()).await?;
                history.push(ChatTurn {
                    question: question.to_string(),
                    answer,
                });
            }
            QueryOutcome::ExitRequested => {
                writer.write_all(b"Goodbye.\n").await?;
                writer.flush().await?;
                return Ok(history);
            }
            QueryOutcome::Failed(message) => {
                warn!("Question failed: {}", message);
                writer
                    .write_all(format!("Error: {}\n", message).as_bytes())
                    .await?;
            }
        }

        writer.write_all(b"> ").await?;
        writer.flush().await?;
    }

    Ok(history)
}

/// Delete the persisted index so the next query rebuilds it
pub async fn reset_index() -> Result<()> {
    let state = load_state().await?;
    let builder = state.query_handler.builder();

    if builder.reset_persisted().await? {
        println!(
            "🗑️  Removed persisted index at {:?}",
            builder.persist_directory()
        );
    } else {
        println!(
            "No persisted index at {:?}",
            builder.persist_directory()
        );
    }

    Ok(())
}

/// Print the effective configuration and index state
pub async fn status() -> Result<()> {
    let state = load_state().await?;
    let rag = state.query_handler.config();
    let builder = state.query_handler.builder();

    println!("{}", crate::version::get_version_string());
    println!("  Storage backend:  {}", state.storage_backend);
    println!("  Bucket:           {}", rag.bucket);
    println!("  Corpus key:       {}", rag.default_corpus_key);
    println!("  Persist index:    {}", rag.persist);
    println!("  Persist dir:      {:?}", builder.persist_directory());
    println!("  Index persisted:  {}", builder.has_persisted());
    println!("  Top k:            {}", rag.top_k);

    Ok(())
}
