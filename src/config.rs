//! Runtime configuration, read from the environment.
//!
//! A `.env` file in the working directory is honoured (see [`load_dotenv`]).
//! Unset variables fall back to the defaults below; set-but-invalid ones are
//! reported rather than ignored.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Tokens;

pub const DEFAULT_STORY_COST: Tokens = 50;
pub const DEFAULT_INITIAL_GRANT: Tokens = 100;
pub const DEFAULT_PURCHASE_AMOUNT: Tokens = 100;
pub const DEFAULT_LIST_LIMIT: usize = 50;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// How a debit reaches the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMode {
    /// Read the balance, compute the new value, overwrite it, then append the
    /// story as a separate write. Concurrent debits can lose updates and a
    /// failure between the two writes leaves them inconsistent.
    Sequential,
    /// Conditional decrement and story append in one store transaction.
    #[default]
    Atomic,
}

impl FromStr for SettlementMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "atomic" => Ok(Self::Atomic),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub story_cost: Tokens,
    pub initial_grant: Tokens,
    pub purchase_amount: Tokens,
    pub list_limit: usize,
    pub settlement: SettlementMode,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            story_cost: DEFAULT_STORY_COST,
            initial_grant: DEFAULT_INITIAL_GRANT,
            purchase_amount: DEFAULT_PURCHASE_AMOUNT,
            list_limit: DEFAULT_LIST_LIMIT,
            settlement: SettlementMode::default(),
        }
    }
}

impl LedgerConfig {
    /// Reads `STORY_COST`, `INITIAL_GRANT`, `PURCHASE_AMOUNT`, `STORY_LIST_LIMIT`
    /// and `SETTLEMENT_MODE`. Cost and purchase amount must be positive, the
    /// grant must not be negative.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            story_cost: parse_tokens(&lookup, "STORY_COST", defaults.story_cost, 1)?,
            initial_grant: parse_tokens(&lookup, "INITIAL_GRANT", defaults.initial_grant, 0)?,
            purchase_amount: parse_tokens(
                &lookup,
                "PURCHASE_AMOUNT",
                defaults.purchase_amount,
                1,
            )?,
            list_limit: parse_var(&lookup, "STORY_LIST_LIMIT", defaults.list_limit)?,
            settlement: parse_var(&lookup, "SETTLEMENT_MODE", defaults.settlement)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    /// `None` when `GEMINI_API_KEY` is unset or blank.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty())?;
        Some(Self {
            api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        })
    }
}

/// Loads `.env` if there is one. A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(%err, "failed to load .env"),
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { var, value }),
    }
}

/// Like [`parse_var`], but also rejects amounts below `min`.
fn parse_tokens(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: Tokens,
    min: Tokens,
) -> Result<Tokens, ConfigError> {
    let tokens = parse_var(lookup, var, default)?;
    if tokens < min {
        return Err(ConfigError {
            var,
            value: tokens.to_string(),
        });
    }
    Ok(tokens)
}
