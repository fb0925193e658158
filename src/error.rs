//! Errors for the token ledger and story archive.
//!
//! Contains error variants for the failure cases a user action can hit:
//! - Store errors (backing store unreachable, snapshot unreadable)
//! - Ledger errors (balance below the generation cost, balance overflow)
//! - Generation errors (provider failed, or the story could not be persisted)
//! - Input errors (missing user id, incomplete prompt)
//!
//! None of these are fatal to a session: callers turn them into a transient
//! notification and the user may simply retry.

use crate::Tokens;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing store could not be reached or rejected the operation.
    #[error("store unavailable during {operation}: {message}")]
    StoreUnavailable {
        operation: &'static str,
        message: String,
    },

    /// The text provider failed or returned nothing usable.
    #[error("story generation failed: {0}")]
    GenerationFailed(String),

    #[error("insufficient balance: {balance} tokens available, {cost} required")]
    InsufficientBalance { balance: Tokens, cost: Tokens },

    /// The story was generated but persisting the outcome failed. The text is
    /// handed back so it can still be shown.
    #[error("story generated but not saved: {reason}")]
    StoryNotSaved { content: String, reason: String },

    /// Applying `delta` would take the balance outside the representable range.
    #[error("balance {balance} cannot be adjusted by {delta}")]
    BalanceOverflow { balance: Tokens, delta: Tokens },

    #[error("user id must not be empty")]
    InvalidUserId,

    #[error("prompt field `{0}` must not be empty")]
    IncompletePrompt(&'static str),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl Error {
    pub fn unavailable(operation: &'static str, message: impl ToString) -> Self {
        Self::StoreUnavailable {
            operation,
            message: message.to_string(),
        }
    }

    /// Store failures are always safe to retry; nothing was half-written.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::GenerationFailed(_))
    }
}
