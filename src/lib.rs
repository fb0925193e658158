pub mod clock;
pub mod config;
pub mod csv_utils;
mod dto;
mod engine;
mod error;
pub mod generator;
mod runner;
mod session;
pub mod stores;

/// Token amounts. Signed: a raw overwrite may store a negative balance.
pub type Tokens = i64;

pub use config::{GeminiConfig, LedgerConfig, SettlementMode};
pub use dto::{AccountRow, ActionType, Request};
pub use engine::{GeneratedStory, Storyteller};
pub use error::{Error, Result};
pub use generator::{GeminiClient, OfflineGenerator, StoryGenerator, StoryPrompt};
pub use runner::{run, RunSummary};
pub use session::{Session, UserId};
pub use stores::{MemoryStore, StoryRecord};
