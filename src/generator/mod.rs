//! The text provider that turns a prompt into a story.
//!
//! The core only sees [`StoryGenerator`]; [`GeminiClient`] talks to the hosted
//! model and [`OfflineGenerator`] writes a deterministic story locally.

mod gemini;
mod offline;
mod prompt;

use async_trait::async_trait;

use crate::Result;

pub use gemini::GeminiClient;
pub use offline::OfflineGenerator;
pub use prompt::StoryPrompt;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// Returns the story text, or `GenerationFailed`.
    async fn generate(&self, prompt: &StoryPrompt) -> Result<String>;
}
