//! Storage layer for the ledger. Provides:
//! - The store abstraction and its in-process implementation ([`DocumentStore`], [`MemoryStore`])
//! - Token balances per user ([`AccountStore`])
//! - The history of generated stories ([`StoryArchive`])
//!
//! The store is passed in explicitly; nothing here holds a global handle.

mod accounts;
mod document;
mod memory;
mod stories;

pub use accounts::{Account, AccountStore};
pub use document::{Collection, DocumentStore};
pub use memory::MemoryStore;
pub use stories::{StoryArchive, StoryRecord};
