//! Persistence collaborator.
//!
//! Users, balances, transactions, per-user history and the global draw feed
//! live in an external document store. This module defines the contract the
//! rest of the system writes against plus an in-memory implementation.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::InMemoryStore;

use crate::clock::PeriodId;
use crate::round::{Color, Digit, HistoryRecord, Outcome, Size};

/// Errors surfaced by the document store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("User {user_id} not found")]
    UserNotFound { user_id: String },

    #[error("User {user_id} already exists")]
    UserExists { user_id: String },

    #[error("Document {id} not found in {collection}")]
    DocumentNotFound { collection: String, id: String },

    #[error("User {user_id} has {balance}, cannot withdraw {requested}")]
    InsufficientFunds {
        user_id: String,
        balance: f64,
        requested: f64,
    },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Account document keyed by the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub money: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Deposit => f.write_str("Deposit"),
            TransactionKind::Withdrawal => f.write_str("Withdrawal"),
        }
    }
}

/// Wallet movement stored under the user's `transactions` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(kind: TransactionKind, amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            kind,
            timestamp,
        }
    }
}

/// Entry of the global `randomData` draw feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRecord {
    pub id: Uuid,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub number: Digit,
    pub colors: Vec<Color>,
    pub big_small: Size,
    pub period: PeriodId,
    pub date: NaiveDate,
    pub track: String,
}

impl From<&Outcome> for DrawRecord {
    fn from(outcome: &Outcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: outcome.timestamp,
            number: outcome.drawn_number,
            colors: outcome.colors.clone(),
            big_small: outcome.big_small,
            period: outcome.period,
            date: outcome.timestamp.date_naive(),
            track: outcome.track.clone(),
        }
    }
}

/// Admin-curated draw for a room (track).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDraw {
    pub id: Uuid,
    pub room_id: u32,
    pub number: Digit,
    pub color: Color,
    pub size: Size,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Where settled bets and staged draws are written.
///
/// Writes are single attempts; callers log failures and carry on.
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Appends a settled bet to the user's history.
    ///
    /// # Errors
    /// - `StoreError::UserNotFound` - No account for `user_id`
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn append_history(&self, user_id: &str, record: HistoryRecord) -> Result<(), StoreError>;

    /// Appends an entry to the global draw feed.
    ///
    /// # Errors
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn record_draw(&self, draw: DrawRecord) -> Result<(), StoreError>;
}

/// Full document store contract used by the API server.
#[async_trait]
pub trait GameStore: HistorySink {
    /// Registers a user with a zero balance.
    ///
    /// # Errors
    /// - `StoreError::UserExists` - Id already registered
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn create_user(&self, user_id: &str) -> Result<UserAccount, StoreError>;

    /// # Errors
    /// - `StoreError::UserNotFound` - No account for `user_id`
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn user(&self, user_id: &str) -> Result<UserAccount, StoreError>;

    /// Moves the balance by the transaction amount and appends the transaction.
    ///
    /// The balance check and the write happen atomically, so concurrent
    /// withdrawals can never take the balance below zero.
    ///
    /// # Errors
    /// - `StoreError::UserNotFound` - No account for `user_id`
    /// - `StoreError::InsufficientFunds` - Withdrawal exceeds the balance
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn apply_transaction(
        &self,
        user_id: &str,
        transaction: Transaction,
    ) -> Result<UserAccount, StoreError>;

    /// Transactions of a user, newest first.
    ///
    /// # Errors
    /// - `StoreError::UserNotFound` - No account for `user_id`
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn transactions(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError>;

    /// History of a user, newest first.
    ///
    /// # Errors
    /// - `StoreError::UserNotFound` - No account for `user_id`
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn history(&self, user_id: &str) -> Result<Vec<HistoryRecord>, StoreError>;

    /// Newest `limit` draws ordered by timestamp descending.
    ///
    /// # Errors
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn recent_draws(&self, limit: usize) -> Result<Vec<DrawRecord>, StoreError>;

    /// # Errors
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn add_admin_draw(&self, draw: AdminDraw) -> Result<(), StoreError>;

    /// Admin draws, optionally limited to one room, newest first.
    ///
    /// # Errors
    /// - `StoreError::Unavailable` - Store could not be reached
    async fn admin_draws(&self, room_id: Option<u32>) -> Result<Vec<AdminDraw>, StoreError>;
}
