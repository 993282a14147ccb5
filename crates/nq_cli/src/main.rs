use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nq_core::{ArticleStore, Error, Result};
use nq_inference::{
    Backend, EmbeddingConfig, EmbeddingGateway, LlmConfig, LlmGateway, RetrievalConfig, Retriever,
    Synthesizer, SynthesisConfig,
};
use nq_storage::{MemoryStore, SqliteStore};
use nq_web::AppState;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "sqlite")]
    storage: String,

    /// Path to the sqlite database
    #[arg(long, default_value = "news.db")]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Ask a question over the stored articles
    Ask {
        question: String,
        #[arg(long, default_value = "groq")]
        backend: Backend,
    },
    /// Produce a digest of the recent news window
    Digest {
        #[arg(long, default_value_t = 7)]
        days: i64,
        #[arg(long, default_value = "gemini")]
        backend: Backend,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,
    },
}

async fn create_store(kind: &str, db_path: &PathBuf) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => Ok(Arc::new(SqliteStore::open(db_path).await?)),
        other => Err(Error::Configuration(format!("unknown storage backend: {other}"))),
    }
}

fn build_synthesizer(store: Arc<dyn ArticleStore>) -> Result<Synthesizer> {
    let embeddings = Arc::new(EmbeddingGateway::new(EmbeddingConfig::from_env()));
    let retriever = Retriever::new(store.clone(), embeddings, RetrievalConfig::default());
    let gateway = Arc::new(LlmGateway::new(&LlmConfig::from_env())?);
    Ok(Synthesizer::new(store, retriever, gateway, SynthesisConfig::default()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let store = create_store(&cli.storage, &cli.db_path).await?;
    info!(storage = %cli.storage, "storage initialized");
    let synthesizer = build_synthesizer(store)?;

    match cli.command {
        Commands::Ask { question, backend } => {
            let answer = synthesizer.answer_question(&question, backend).await;
            println!("{answer}");
        }
        Commands::Digest { days, backend } => {
            let digest = synthesizer.summarize_period(days, backend).await;
            println!("{digest}");
        }
        Commands::Serve { addr } => {
            nq_web::serve(&addr, AppState { synthesizer: Arc::new(synthesizer) }).await?;
        }
    }

    Ok(())
}
