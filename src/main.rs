use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use story_ledger::{
    config, run, GeminiClient, GeminiConfig, LedgerConfig, MemoryStore, OfflineGenerator,
    StoryGenerator, Storyteller,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run_app().await {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

async fn run_app() -> anyhow::Result<()> {
    config::load_dotenv();

    // stdout carries the CSV, so logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "story_ledger=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        return Err(anyhow!("Usage: cargo run -- requests.csv"));
    }

    let config = LedgerConfig::from_env()?;
    let generator: Arc<dyn StoryGenerator> = match GeminiConfig::from_env() {
        Some(gemini) => {
            tracing::info!(model = %gemini.model, "using hosted story generator");
            Arc::new(GeminiClient::new(&gemini))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set, using offline story generator");
            Arc::new(OfflineGenerator)
        }
    };

    // Optional snapshot that carries the ledger across runs.
    let state_path = env::var("STORY_LEDGER_STATE").ok().map(PathBuf::from);
    let store = Arc::new(match &state_path {
        Some(path) => MemoryStore::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => MemoryStore::new(),
    });

    let storyteller = Arc::new(Storyteller::new(store.clone(), generator, config));
    let summary = run(&args[1], storyteller, std::io::stdout())
        .await
        .map_err(|err| anyhow!(err))?;
    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        "run complete"
    );

    if let Some(path) = &state_path {
        store.save(path).await?;
    }
    Ok(())
}
