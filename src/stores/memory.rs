//! In-process [`DocumentStore`].
//!
//! Both collections sit behind one async mutex, which is what makes
//! `settle_generation` transactional. Outages can be switched on per
//! collection to exercise the failure paths, and the whole state can be
//! written to / read from a JSON snapshot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::stores::{Account, Collection, DocumentStore, StoryRecord};
use crate::{Error, Result, Tokens, UserId};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct UserDocument {
    // A document without the field reads as an empty balance.
    #[serde(default)]
    tokens: Tokens,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collections {
    users: BTreeMap<UserId, UserDocument>,
    /// Insertion order.
    stories: Vec<StoryRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Collections>,
    users_offline: AtomicBool,
    stories_offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the collection being unreachable (or reachable again).
    pub fn set_offline(&self, collection: Collection, offline: bool) {
        self.flag(collection).store(offline, Ordering::SeqCst);
    }

    /// Loads a snapshot written by [`MemoryStore::save`]. A missing file
    /// yields an empty store.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => return Err(Error::Snapshot(format!("{}: {err}", path.display()))),
        };
        let collections: Collections = serde_json::from_slice(&bytes)
            .map_err(|err| Error::Snapshot(format!("{}: {err}", path.display())))?;
        tracing::debug!(
            path = %path.display(),
            users = collections.users.len(),
            stories = collections.stories.len(),
            "snapshot loaded"
        );
        Ok(Self {
            state: Mutex::new(collections),
            ..Self::default()
        })
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = {
            let state = self.state.lock().await;
            serde_json::to_vec_pretty(&*state).map_err(|err| Error::Snapshot(err.to_string()))?
        };
        tokio::fs::write(path, bytes)
            .await
            .map_err(|err| Error::Snapshot(format!("{}: {err}", path.display())))
    }

    /// All accounts, ordered by user id.
    pub async fn accounts(&self) -> Vec<Account> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .map(|(user_id, doc)| Account {
                user_id: user_id.clone(),
                tokens: doc.tokens,
            })
            .collect()
    }

    pub async fn story_count(&self, user: &UserId) -> usize {
        let state = self.state.lock().await;
        state.stories.iter().filter(|s| &s.user_id == user).count()
    }

    fn flag(&self, collection: Collection) -> &AtomicBool {
        match collection {
            Collection::Users => &self.users_offline,
            Collection::Stories => &self.stories_offline,
        }
    }

    fn ensure_online(&self, collection: Collection, operation: &'static str) -> Result<()> {
        if self.flag(collection).load(Ordering::SeqCst) {
            return Err(Error::unavailable(
                operation,
                format!("{collection} collection is offline"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read_account(&self, user: &UserId) -> Result<Option<Account>> {
        self.ensure_online(Collection::Users, "read_account")?;
        let state = self.state.lock().await;
        Ok(state.users.get(user).map(|doc| Account {
            user_id: user.clone(),
            tokens: doc.tokens,
        }))
    }

    async fn create_account(&self, user: &UserId, tokens: Tokens) -> Result<Account> {
        self.ensure_online(Collection::Users, "create_account")?;
        let mut state = self.state.lock().await;
        let doc = state
            .users
            .entry(user.clone())
            .or_insert(UserDocument { tokens });
        Ok(Account {
            user_id: user.clone(),
            tokens: doc.tokens,
        })
    }

    async fn write_balance(&self, user: &UserId, tokens: Tokens) -> Result<()> {
        self.ensure_online(Collection::Users, "write_balance")?;
        let mut state = self.state.lock().await;
        state.users.insert(user.clone(), UserDocument { tokens });
        Ok(())
    }

    async fn adjust_balance(
        &self,
        user: &UserId,
        delta: Tokens,
        floor: Option<Tokens>,
    ) -> Result<Tokens> {
        self.ensure_online(Collection::Users, "adjust_balance")?;
        let mut state = self.state.lock().await;
        let doc = state.users.entry(user.clone()).or_default();
        let updated = doc.tokens.checked_add(delta).ok_or(Error::BalanceOverflow {
            balance: doc.tokens,
            delta,
        })?;
        if let Some(floor) = floor {
            if updated < floor {
                return Err(Error::InsufficientBalance {
                    balance: doc.tokens,
                    cost: -delta,
                });
            }
        }
        doc.tokens = updated;
        Ok(updated)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.ensure_online(Collection::Users, "list_accounts")?;
        Ok(self.accounts().await)
    }

    async fn insert_story(&self, record: StoryRecord) -> Result<()> {
        self.ensure_online(Collection::Stories, "insert_story")?;
        self.state.lock().await.stories.push(record);
        Ok(())
    }

    async fn count_stories(&self, user: &UserId) -> Result<usize> {
        self.ensure_online(Collection::Stories, "count_stories")?;
        Ok(self.story_count(user).await)
    }

    async fn stories_for_user(&self, user: &UserId, limit: usize) -> Result<Vec<StoryRecord>> {
        self.ensure_online(Collection::Stories, "stories_for_user")?;
        let state = self.state.lock().await;
        // The most recently inserted `limit`, handed back in insertion order.
        let mut records: Vec<_> = state
            .stories
            .iter()
            .rev()
            .filter(|s| &s.user_id == user)
            .take(limit)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }

    async fn settle_generation(
        &self,
        user: &UserId,
        cost: Tokens,
        record: StoryRecord,
    ) -> Result<Tokens> {
        self.ensure_online(Collection::Users, "settle_generation")?;
        self.ensure_online(Collection::Stories, "settle_generation")?;
        let mut state = self.state.lock().await;
        let balance = state.users.get(user).map(|doc| doc.tokens).unwrap_or(0);
        if balance < cost {
            return Err(Error::InsufficientBalance { balance, cost });
        }
        let remaining = balance.checked_sub(cost).ok_or(Error::BalanceOverflow {
            balance,
            delta: -cost,
        })?;
        state
            .users
            .insert(user.clone(), UserDocument { tokens: remaining });
        state.stories.push(record);
        Ok(remaining)
    }
}
