use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use localrag_core::config::{expand_path, Config, Settings};
use localrag_core::error::Error;
use localrag_core::Embedder;
use localrag_embed::get_default_embedder;
use localrag_retrieval::{RetrievalOutcome, RetrievalService};

#[derive(Parser)]
#[command(name = "localrag", version, about = "Index local documents and retrieve passages by meaning")]
struct Cli {
    /// Use the hashing embedder instead of loading a model
    #[arg(long, global = true)]
    fake_embeddings: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and index every supported file in a directory
    Ingest {
        /// Defaults to `data.docs_dir`
        dir: Option<PathBuf>,
    },
    /// Retrieve the chunks most similar to a query
    Query {
        text: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print the structured outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what the saved index holds
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    info!(env = config.env_name(), index = %settings.index.path, "configuration loaded");
    if cli.fake_embeddings {
        settings.embedding.use_fake = true;
    }

    let embedder = get_default_embedder(&settings.embedding)?;
    let mut service = RetrievalService::from_settings(embedder, &settings)?;

    match cli.command {
        Command::Ingest { dir } => ingest(&mut service, &settings, dir),
        Command::Query { text, top_k, json } => query(&mut service, &text, top_k, json),
        Command::Stats => stats(&mut service),
    }
}

fn ingest<E: Embedder>(service: &mut RetrievalService<E>, settings: &Settings, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| expand_path(&settings.data.docs_dir));
    println!("Ingesting from {}", dir.display());

    match service.load() {
        Ok(existing) => println!("Appending to existing index ({} chunks)", existing),
        Err(Error::NotFound(_)) => {}
        Err(e) => return Err(e).context("existing index could not be loaded"),
    }

    let count = service.index_directory(&dir)?;
    println!("✅ Ingest complete ({} new chunks, {} total)", count, service.len());
    println!("Index saved to {}", service.index_path().display());
    Ok(())
}

fn query<E: Embedder>(service: &mut RetrievalService<E>, text: &str, top_k: Option<usize>, json: bool) -> anyhow::Result<()> {
    let k = top_k.unwrap_or(service.top_k());
    let load_error = service.load().err();

    if json {
        let outcome = match load_error {
            Some(e) => RetrievalOutcome::from_result(text, Err(e)),
            None => service.query(text, k),
        };
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if let Some(e) = load_error {
        return Err(e).context("no saved index; run `localrag ingest` first");
    }
    let results = service.retrieve(text, k)?;
    if results.is_empty() {
        println!("No results.");
    }
    for r in &results {
        println!("\n#{} [{:.4}] {} ({}, chunk {})", r.rank, r.similarity_score, r.metadata.title, r.metadata.source, r.metadata.chunk_id);
        println!("{}", r.metadata.content);
    }
    Ok(())
}

fn stats<E: Embedder>(service: &mut RetrievalService<E>) -> anyhow::Result<()> {
    match service.load() {
        Ok(count) => {
            println!("Index:      {}", service.index_path().display());
            println!("Chunks:     {}", count);
            println!("Dimension:  {}", service.index().dim());
            Ok(())
        }
        Err(Error::NotFound(path)) => {
            println!("No index at {} (missing {})", service.index_path().display(), path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
