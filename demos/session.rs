//! Walks one signed-in user through a short session: check the balance,
//! write two stories, run out of tokens, buy more, and list the history.
//!
//! Uses the hosted model when `GEMINI_API_KEY` is set, otherwise the offline
//! generator.
//!
//! ```bash
//! cargo run --example session -- "a knight" "a castle" "a storm"
//! ```

use std::env;
use std::error::Error;
use std::sync::Arc;

use story_ledger::{
    config, GeminiClient, GeminiConfig, LedgerConfig, MemoryStore, OfflineGenerator, Session,
    StoryGenerator, StoryPrompt, Storyteller, UserId,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_ledger=debug".into()),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let prompt = match args.as_slice() {
        [character, setting, twist] => StoryPrompt::new(character, setting, twist)?,
        [] => StoryPrompt::new("a knight", "a castle", "a storm")?,
        _ => return Err("Usage: cargo run --example session -- <character> <setting> <twist>".into()),
    };

    let generator: Arc<dyn StoryGenerator> = match GeminiConfig::from_env() {
        Some(gemini) => Arc::new(GeminiClient::new(&gemini)),
        None => Arc::new(OfflineGenerator),
    };
    let store = Arc::new(MemoryStore::new());
    let teller = Storyteller::new(store, generator, LedgerConfig::from_env()?);
    let session = Session::new(UserId::new("demo-user")?).with_email("demo@example.com");

    println!("balance: {}", teller.balance(&session).await?);
    for attempt in 1..=3 {
        match teller.generate(&session, &prompt).await {
            Ok(generated) => println!(
                "story {attempt} saved, balance now {}:\n{}\n",
                generated.balance, generated.record.content
            ),
            Err(err) => println!("story {attempt} not generated: {err}"),
        }
    }

    println!("bought tokens, balance now {}", teller.buy_tokens(&session).await?);

    for record in teller.stories(&session).await? {
        println!("{}  {} / {} / {}", record.created_at, record.character, record.setting, record.plot_twist);
    }
    Ok(())
}
