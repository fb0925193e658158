use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{LedgerConfig, SettlementMode};
use crate::dto::AccountRow;
use crate::generator::{StoryGenerator, StoryPrompt};
use crate::stores::{AccountStore, DocumentStore, StoryArchive, StoryRecord};
use crate::{Error, Result, Session, Tokens, UserId};

/// Outcome of a successful, persisted generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStory {
    pub record: StoryRecord,
    /// Balance after the debit.
    pub balance: Tokens,
}

/// Ties balances, the story archive and the text provider together.
pub struct Storyteller {
    store: Arc<dyn DocumentStore>,
    accounts: AccountStore,
    archive: StoryArchive,
    generator: Arc<dyn StoryGenerator>,
    config: LedgerConfig,
}

impl Storyteller {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn StoryGenerator>,
        config: LedgerConfig,
    ) -> Self {
        Self::with_clock(store, generator, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn StoryGenerator>,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts: AccountStore::new(store.clone(), config.initial_grant, config.settlement),
            archive: StoryArchive::new(store.clone(), clock),
            store,
            generator,
            config,
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    /// Every account of the underlying store with its story count, ordered by
    /// user id.
    pub async fn ledger(&self) -> Result<Vec<AccountRow>> {
        let mut rows = Vec::new();
        for account in self.store.list_accounts().await? {
            rows.push(AccountRow {
                stories: self.store.count_stories(&account.user_id).await?,
                user: account.user_id.to_string(),
                tokens: account.tokens,
            });
        }
        rows.sort_by(|a, b| a.user.cmp(&b.user));
        Ok(rows)
    }

    pub async fn balance(&self, session: &Session) -> Result<Tokens> {
        self.accounts.get_balance(&session.user_id).await
    }

    /// Credits one purchase worth of tokens and returns the new balance.
    #[tracing::instrument(skip_all, fields(user = %session.user_id, email = session.email.as_deref()))]
    pub async fn buy_tokens(&self, session: &Session) -> Result<Tokens> {
        let balance = self
            .accounts
            .credit(&session.user_id, self.config.purchase_amount)
            .await?;
        tracing::info!(amount = self.config.purchase_amount, balance, "tokens purchased");
        Ok(balance)
    }

    /// The user's most recent stories, newest first.
    pub async fn stories(&self, session: &Session) -> Result<Vec<StoryRecord>> {
        self.archive
            .list(&session.user_id, self.config.list_limit)
            .await
    }

    /// Spends `story_cost` tokens on a new story and stores it.
    ///
    /// The provider is only called once the balance covers the cost, and a
    /// provider failure leaves balance and archive untouched. If persisting
    /// fails afterwards the text comes back inside [`Error::StoryNotSaved`].
    #[tracing::instrument(
        skip_all,
        fields(user = %session.user_id, email = session.email.as_deref(), mode = ?self.config.settlement)
    )]
    pub async fn generate(&self, session: &Session, prompt: &StoryPrompt) -> Result<GeneratedStory> {
        let user = &session.user_id;
        let cost = self.config.story_cost;

        let balance = self.accounts.get_balance(user).await?;
        if balance < cost {
            tracing::info!(balance, cost, "not enough tokens for a story");
            return Err(Error::InsufficientBalance { balance, cost });
        }

        let content = self
            .generator
            .generate(prompt)
            .await
            .map_err(|err| match err {
                Error::GenerationFailed(_) => err,
                other => Error::GenerationFailed(other.to_string()),
            })?;
        if content.trim().is_empty() {
            return Err(Error::GenerationFailed("provider returned an empty story".into()));
        }

        let generated = match self.config.settlement {
            SettlementMode::Sequential => {
                let remaining = balance
                    .checked_sub(cost)
                    .ok_or(Error::BalanceOverflow { balance, delta: -cost })?;
                self.settle_sequential(user, remaining, prompt, content)
                    .await?
            }
            SettlementMode::Atomic => self.settle_atomic(user, cost, prompt, content).await?,
        };
        tracing::info!(id = %generated.record.id, balance = generated.balance, "story saved");
        Ok(generated)
    }

    // Two independent writes. The debit uses the balance read before
    // generation, and a failed append leaves the debit in place.
    async fn settle_sequential(
        &self,
        user: &UserId,
        remaining: Tokens,
        prompt: &StoryPrompt,
        content: String,
    ) -> Result<GeneratedStory> {
        if let Err(err) = self.accounts.set_balance(user, remaining).await {
            return Err(Error::StoryNotSaved {
                content,
                reason: err.to_string(),
            });
        }
        match self.archive.append(user, prompt, content.clone()).await {
            Ok(record) => Ok(GeneratedStory {
                record,
                balance: remaining,
            }),
            Err(err) => {
                tracing::error!(%err, remaining, "balance debited but story not saved");
                Err(Error::StoryNotSaved {
                    content,
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn settle_atomic(
        &self,
        user: &UserId,
        cost: Tokens,
        prompt: &StoryPrompt,
        content: String,
    ) -> Result<GeneratedStory> {
        let record = self.archive.new_record(user, prompt, content);
        match self
            .store
            .settle_generation(user, cost, record.clone())
            .await
        {
            Ok(balance) => Ok(GeneratedStory { record, balance }),
            // Another session spent the tokens while the story was generated.
            Err(err @ Error::InsufficientBalance { .. }) => Err(err),
            Err(err) => Err(Error::StoryNotSaved {
                content: record.content,
                reason: err.to_string(),
            }),
        }
    }
}
