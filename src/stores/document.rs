//! The persistent store as seen by the ledger: a document store with two
//! collections, `users/{userId}` holding a token balance and `stories/{id}`
//! holding generated stories.
//!
//! Only the query shapes the ledger needs are exposed. Every operation may
//! fail with [`Error::StoreUnavailable`](crate::Error::StoreUnavailable);
//! single-document writes are all-or-nothing.

use async_trait::async_trait;
use std::fmt;

use crate::stores::{Account, StoryRecord};
use crate::{Result, Tokens, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Stories,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Stories => "stories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read of `users/{user}`.
    async fn read_account(&self, user: &UserId) -> Result<Option<Account>>;

    /// Creates `users/{user}` with `tokens` unless it already exists, and
    /// returns whichever document is stored afterwards.
    async fn create_account(&self, user: &UserId, tokens: Tokens) -> Result<Account>;

    /// Overwrites the balance. No validation of any kind.
    async fn write_balance(&self, user: &UserId, tokens: Tokens) -> Result<()>;

    /// Adds `delta` to the balance in one step and returns the new balance.
    /// With a `floor`, fails with `InsufficientBalance` instead of going below it.
    /// A result outside the `Tokens` range fails with `BalanceOverflow`.
    async fn adjust_balance(&self, user: &UserId, delta: Tokens, floor: Option<Tokens>)
        -> Result<Tokens>;

    /// Every `users/*` document, ordered by user id.
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    async fn insert_story(&self, record: StoryRecord) -> Result<()>;

    /// Number of `stories/*` documents owned by `user`.
    async fn count_stories(&self, user: &UserId) -> Result<usize>;

    /// Up to `limit` stories of `user`. The order is unspecified.
    async fn stories_for_user(&self, user: &UserId, limit: usize) -> Result<Vec<StoryRecord>>;

    /// Debits `cost` (only if the balance covers it) and appends `record` as a
    /// single unit: either both happen or neither does. Returns the new balance.
    async fn settle_generation(
        &self,
        user: &UserId,
        cost: Tokens,
        record: StoryRecord,
    ) -> Result<Tokens>;
}
