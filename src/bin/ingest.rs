//! Builds the persisted vector store from the FAQ dataset.

use std::path::PathBuf;
use std::sync::Arc;

use ai_llm_service::{LlmServiceProfiles, telemetry};
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rag_store::{DEFAULT_EMBED_BATCH_SIZE, GeminiEmbedder, IndicatifProgress, RagStore, StoreConfig};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "ingest",
    about = "Embed the FAQ dataset and write the flat index + metadata files"
)]
struct IngestCli {
    /// Dataset with `pattern`, `tag` and `response` columns (.csv or .jsonl)
    #[arg(long, env = "DATASET_PATH", default_value = rag_store::DEFAULT_DATASET_PATH)]
    dataset: PathBuf,

    /// Output path of the binary index
    #[arg(long, env = "INDEX_PATH", default_value = rag_store::DEFAULT_INDEX_PATH)]
    index_out: PathBuf,

    /// Output path of the JSON metadata
    #[arg(long, env = "META_PATH", default_value = rag_store::DEFAULT_META_PATH)]
    meta_out: PathBuf,

    /// Texts per embedding request
    #[arg(long, env = "EMBED_BATCH_SIZE", default_value_t = DEFAULT_EMBED_BATCH_SIZE)]
    batch_size: usize,

    /// Expected embedding dimension (discovered from the first vector if omitted)
    #[arg(long, env = "EMBEDDING_DIM")]
    dim: Option<usize>,

    /// Debug logging for the store crate
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("reading .env");
        }
    }
    let cli = IngestCli::parse();

    let mut filter = telemetry::env_filter("info");
    if cli.verbose {
        if let Some(d) = telemetry::level_directive("rag_store", Level::DEBUG) {
            filter = filter.add_directive(d);
        }
    }
    telemetry::init_with_filter(filter);

    let cfg = StoreConfig {
        dataset_path: cli.dataset,
        index_path: cli.index_out,
        meta_path: cli.meta_out,
        embed_batch_size: cli.batch_size,
        embedding_dim: cli.dim,
    };

    println!("{} {}", "Dataset:".bold(), cfg.dataset_path.display());

    let svc = Arc::new(LlmServiceProfiles::from_env().context("GEMINI_API_KEY must be set")?);
    let embedder = Arc::new(GeminiEmbedder::new(svc, cfg.embedding_dim));
    let store = RagStore::new(cfg, embedder)?;
    let cfg = store.config();
    if store.exists() {
        println!("{}", "Replacing the existing index".yellow());
    }

    let stats = store
        .ingest(Arc::new(IndicatifProgress::bar(0)))
        .await
        .with_context(|| format!("ingesting {}", cfg.dataset_path.display()))?;

    println!(
        "{} {} rows, dim={}, {} ms",
        "Index OK:".green().bold(),
        stats.rows,
        stats.dim,
        stats.duration_ms
    );
    println!("  - {}", cfg.index_path.display());
    println!("  - {}", cfg.meta_path.display());
    Ok(())
}
