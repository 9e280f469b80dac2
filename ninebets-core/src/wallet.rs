//! Wallet deposits, withdrawals and transaction listings.
//!
//! Validation happens before any write: a rejected amount or an overdraft
//! leaves the stored balance and transaction list untouched.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{GameStore, StoreError, Transaction, TransactionKind, UserAccount};

/// Errors from wallet operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalletError {
    #[error("Please enter a valid amount: {input}")]
    InvalidAmount { input: String },

    #[error("Insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance { balance: f64, requested: f64 },

    #[error("Unknown transaction filter: {input}")]
    InvalidFilter { input: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parses a user-entered amount; must be a finite number above zero.
///
/// # Errors
///
/// - `WalletError::InvalidAmount` - Not numeric, not finite, or not positive
pub fn parse_amount(input: &str) -> Result<f64, WalletError> {
    let invalid = || WalletError::InvalidAmount {
        input: input.to_string(),
    };
    let amount = input.trim().parse::<f64>().map_err(|_| invalid())?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(invalid());
    }
    Ok(amount)
}

/// Time window applied to transaction listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionFilter {
    #[default]
    All,
    Today,
    ThisMonth,
}

impl TransactionFilter {
    /// Whether `transaction` falls in the window as seen at `now` (UTC).
    pub fn matches(self, transaction: &Transaction, now: DateTime<Utc>) -> bool {
        let stamp = transaction.timestamp;
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Today => stamp.date_naive() == now.date_naive(),
            TransactionFilter::ThisMonth => {
                stamp.year() == now.year() && stamp.month() == now.month()
            }
        }
    }
}

impl FromStr for TransactionFilter {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TransactionFilter::All),
            "today" => Ok(TransactionFilter::Today),
            "this_month" | "thisMonth" => Ok(TransactionFilter::ThisMonth),
            _ => Err(WalletError::InvalidFilter {
                input: s.to_string(),
            }),
        }
    }
}

/// Balance plus filtered transactions, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSummary {
    pub balance: f64,
    pub transactions: Vec<Transaction>,
}

/// Wallet operations over the document store.
#[derive(Clone)]
pub struct WalletService {
    store: Arc<dyn GameStore>,
}

impl WalletService {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// Adds `amount` to the user's balance.
    ///
    /// # Errors
    ///
    /// - `WalletError::InvalidAmount` - Amount not finite or not positive
    /// - `WalletError::Store` - User missing or store unavailable
    pub async fn deposit(&self, user_id: &str, amount: f64) -> Result<UserAccount, WalletError> {
        self.transact(user_id, TransactionKind::Deposit, amount).await
    }

    /// Removes `amount` from the user's balance.
    ///
    /// # Errors
    ///
    /// - `WalletError::InvalidAmount` - Amount not finite or not positive
    /// - `WalletError::InsufficientBalance` - Balance would become negative
    /// - `WalletError::Store` - User missing or store unavailable
    pub async fn withdraw(&self, user_id: &str, amount: f64) -> Result<UserAccount, WalletError> {
        self.transact(user_id, TransactionKind::Withdrawal, amount)
            .await
    }

    async fn transact(
        &self,
        user_id: &str,
        kind: TransactionKind,
        amount: f64,
    ) -> Result<UserAccount, WalletError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(WalletError::InvalidAmount {
                input: amount.to_string(),
            });
        }

        let transaction = Transaction::new(kind, amount, Utc::now());
        let updated = self
            .store
            .apply_transaction(user_id, transaction)
            .await
            .map_err(|e| match e {
                StoreError::InsufficientFunds {
                    balance, requested, ..
                } => WalletError::InsufficientBalance { balance, requested },
                other => WalletError::Store(other),
            })?;

        tracing::info!(user_id, %kind, amount, balance = updated.money, "Wallet transaction applied");
        Ok(updated)
    }

    /// Current balance and the transactions matching `filter`.
    ///
    /// # Errors
    ///
    /// - `WalletError::Store` - User missing or store unavailable
    pub async fn summary(
        &self,
        user_id: &str,
        filter: TransactionFilter,
        now: DateTime<Utc>,
    ) -> Result<WalletSummary, WalletError> {
        let account = self.store.user(user_id).await?;
        let transactions = self
            .store
            .transactions(user_id)
            .await?
            .into_iter()
            .filter(|transaction| filter.matches(transaction, now))
            .collect();

        Ok(WalletSummary {
            balance: account.money,
            transactions,
        })
    }
}
