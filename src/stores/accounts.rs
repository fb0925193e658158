use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SettlementMode;
use crate::stores::DocumentStore;
use crate::{Error, Result, Tokens, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub tokens: Tokens,
}

impl Account {
    /// Document path in the store.
    pub fn path(&self) -> String {
        format!("users/{}", self.user_id)
    }
}

/// Per-user token balances.
///
/// In [`SettlementMode::Sequential`] debits and credits are read-modify-write
/// sequences, so two concurrent debits starting from the same balance both
/// succeed and the later write wins. [`SettlementMode::Atomic`] pushes the
/// arithmetic into the store instead.
pub struct AccountStore {
    store: Arc<dyn DocumentStore>,
    initial_grant: Tokens,
    mode: SettlementMode,
}

impl AccountStore {
    pub fn new(store: Arc<dyn DocumentStore>, initial_grant: Tokens, mode: SettlementMode) -> Self {
        Self {
            store,
            initial_grant,
            mode,
        }
    }

    /// Returns the stored balance, creating the account with the initial
    /// grant on first access.
    pub async fn get_balance(&self, user: &UserId) -> Result<Tokens> {
        if let Some(account) = self.store.read_account(user).await? {
            return Ok(account.tokens);
        }
        let account = self.store.create_account(user, self.initial_grant).await?;
        tracing::info!(path = %account.path(), tokens = account.tokens, "account created");
        Ok(account.tokens)
    }

    /// Overwrites the balance with `tokens` as given. Negative values are
    /// stored too.
    pub async fn set_balance(&self, user: &UserId, tokens: Tokens) -> Result<()> {
        self.store.write_balance(user, tokens).await?;
        tracing::debug!(%user, tokens, "balance overwritten");
        Ok(())
    }

    /// Takes `cost` from the balance and returns what is left.
    pub async fn debit(&self, user: &UserId, cost: Tokens) -> Result<Tokens> {
        match self.mode {
            SettlementMode::Sequential => {
                let balance = self.get_balance(user).await?;
                if balance < cost {
                    return Err(Error::InsufficientBalance { balance, cost });
                }
                let remaining = balance
                    .checked_sub(cost)
                    .ok_or(Error::BalanceOverflow { balance, delta: -cost })?;
                self.set_balance(user, remaining).await?;
                Ok(remaining)
            }
            SettlementMode::Atomic => {
                // Materialize first so a new account starts from the grant.
                self.get_balance(user).await?;
                self.store.adjust_balance(user, -cost, Some(0)).await
            }
        }
    }

    /// Adds `amount` to the balance and returns the new total.
    pub async fn credit(&self, user: &UserId, amount: Tokens) -> Result<Tokens> {
        match self.mode {
            SettlementMode::Sequential => {
                let balance = self.get_balance(user).await?;
                let updated = balance
                    .checked_add(amount)
                    .ok_or(Error::BalanceOverflow { balance, delta: amount })?;
                self.set_balance(user, updated).await?;
                Ok(updated)
            }
            SettlementMode::Atomic => {
                self.get_balance(user).await?;
                self.store.adjust_balance(user, amount, None).await
            }
        }
    }
}
