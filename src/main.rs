use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use portfolio_rag::chunking::ChunkingConfig;
use portfolio_rag::context::DEFAULT_PERSONA;
use portfolio_rag::database::{QdrantConfig, QdrantStore};
use portfolio_rag::document::load_dataset;
use portfolio_rag::embeddings::EMBEDDING_DIMENSION;
use portfolio_rag::gemini::{GeminiClient, GeminiConfig};
use portfolio_rag::loader::{InvalidEmbeddingPolicy, Loader, LoaderConfig};
use portfolio_rag::rag::{ChatConfig, RagEngine, DEFAULT_TOP_K};
use portfolio_rag::server::{self, AppState};

/// A retrieval-augmented portfolio chat backed by Gemini and Qdrant
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the chat page and the chat API
    Serve(ServeArgs),
    /// Rebuild the collection from the dataset
    Load(LoadArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind: String,

    /// Opening line of the system prompt
    #[arg(long, env = "ASSISTANT_PERSONA", default_value = DEFAULT_PERSONA)]
    persona: String,

    /// Number of chunks retrieved per question
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: u64,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Path to the JSON dataset
    #[arg(long, env = "DATASET_PATH", default_value = "data/portfolio.json")]
    data: PathBuf,

    /// Maximum chunk length in characters
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = 200)]
    chunk_overlap: usize,

    /// How to handle chunks whose embedding failed or has the wrong dimension
    #[arg(long, value_enum, default_value_t = InvalidEmbeddingPolicy::ZeroFill)]
    on_invalid_embedding: InvalidEmbeddingPolicy,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    // Load configuration from environment
    let qdrant_config = QdrantConfig::from_env()?;
    let gemini_config = GeminiConfig::from_env()?;

    match cli.command {
        Command::Serve(args) => serve(args, qdrant_config, gemini_config).await,
        Command::Load(args) => load(args, qdrant_config, gemini_config).await,
    }
}

async fn serve(
    args: ServeArgs,
    qdrant_config: QdrantConfig,
    gemini_config: GeminiConfig,
) -> Result<()> {
    let store = QdrantStore::new(qdrant_config).context("Failed to initialize Qdrant client")?;
    let gemini = Arc::new(GeminiClient::new(gemini_config));

    let engine = RagEngine::new(
        gemini.clone(),
        Arc::new(store),
        gemini,
        ChatConfig {
            persona: args.persona,
            top_k: args.top_k,
        },
    );
    let state = Arc::new(AppState { engine });

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    server::serve(listener, state, shutdown_signal()).await
}

async fn load(
    args: LoadArgs,
    qdrant_config: QdrantConfig,
    gemini_config: GeminiConfig,
) -> Result<()> {
    let records = load_dataset(&args.data)?;
    info!("Loaded {} records from {}", records.len(), args.data.display());

    let store = QdrantStore::new(qdrant_config).context("Failed to initialize Qdrant client")?;
    let gemini = GeminiClient::new(gemini_config);
    info!("Target collection: {}", store.collection());

    let config = LoaderConfig {
        chunking: ChunkingConfig::new(args.chunk_size, args.chunk_overlap)?,
        dimension: EMBEDDING_DIMENSION,
        on_invalid_embedding: args.on_invalid_embedding,
    };

    let loader = Loader::new(&store, &gemini, config)?;
    let report = loader.run(&records).await.context("Fatal error in setup")?;

    if report.zero_filled + report.skipped + report.failed_inserts > 0 {
        warn!(
            "{} chunks zero-filled, {} skipped, {} failed to insert",
            report.zero_filled, report.skipped, report.failed_inserts
        );
    } else {
        info!("All data embedded and stored successfully");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
