//! In-memory document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    AdminDraw, DrawRecord, GameStore, HistorySink, StoreError, Transaction, TransactionKind,
    UserAccount,
};
use crate::round::HistoryRecord;

#[derive(Debug)]
struct UserDocument {
    account: UserAccount,
    transactions: Vec<Transaction>,
    history: Vec<HistoryRecord>,
}

/// Store backed by process memory.
///
/// Mirrors the document layout of the hosted store: a `users` collection with
/// nested `transactions` and `myHistory`, a global `randomData` feed and the
/// admin `draw` collection. Can be switched offline to exercise failure paths.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserDocument>>,
    draws: RwLock<Vec<DrawRecord>>,
    admin_draws: RwLock<Vec<AdminDraw>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "in-memory store is offline".to_string(),
            });
        }
        Ok(())
    }
}

fn user_not_found(user_id: &str) -> StoreError {
    StoreError::UserNotFound {
        user_id: user_id.to_string(),
    }
}

#[async_trait]
impl HistorySink for InMemoryStore {
    async fn append_history(&self, user_id: &str, record: HistoryRecord) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        let document = users
            .get_mut(user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        document.history.push(record);
        Ok(())
    }

    async fn record_draw(&self, draw: DrawRecord) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.draws.write().await.push(draw);
        Ok(())
    }
}

#[async_trait]
impl GameStore for InMemoryStore {
    async fn create_user(&self, user_id: &str) -> Result<UserAccount, StoreError> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        if users.contains_key(user_id) {
            return Err(StoreError::UserExists {
                user_id: user_id.to_string(),
            });
        }

        let account = UserAccount {
            id: user_id.to_string(),
            money: 0.0,
            created_at: Utc::now(),
        };
        users.insert(
            user_id.to_string(),
            UserDocument {
                account: account.clone(),
                transactions: Vec::new(),
                history: Vec::new(),
            },
        );
        Ok(account)
    }

    async fn user(&self, user_id: &str) -> Result<UserAccount, StoreError> {
        self.ensure_online()?;
        let users = self.users.read().await;
        users
            .get(user_id)
            .map(|document| document.account.clone())
            .ok_or_else(|| user_not_found(user_id))
    }

    async fn apply_transaction(
        &self,
        user_id: &str,
        transaction: Transaction,
    ) -> Result<UserAccount, StoreError> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        let document = users
            .get_mut(user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        let balance = document.account.money;
        let money = match transaction.kind {
            TransactionKind::Deposit => balance + transaction.amount,
            TransactionKind::Withdrawal => balance - transaction.amount,
        };
        if money < 0.0 {
            return Err(StoreError::InsufficientFunds {
                user_id: user_id.to_string(),
                balance,
                requested: transaction.amount,
            });
        }
        document.account.money = money;
        document.transactions.push(transaction);
        Ok(document.account.clone())
    }

    async fn transactions(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        self.ensure_online()?;
        let users = self.users.read().await;
        let document = users.get(user_id).ok_or_else(|| user_not_found(user_id))?;
        let mut transactions = document.transactions.clone();
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(transactions)
    }

    async fn history(&self, user_id: &str) -> Result<Vec<HistoryRecord>, StoreError> {
        self.ensure_online()?;
        let users = self.users.read().await;
        let document = users.get(user_id).ok_or_else(|| user_not_found(user_id))?;
        let mut history = document.history.clone();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(history)
    }

    async fn recent_draws(&self, limit: usize) -> Result<Vec<DrawRecord>, StoreError> {
        self.ensure_online()?;
        let mut draws = self.draws.read().await.clone();
        draws.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        draws.truncate(limit);
        Ok(draws)
    }

    async fn add_admin_draw(&self, draw: AdminDraw) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.admin_draws.write().await.push(draw);
        Ok(())
    }

    async fn admin_draws(&self, room_id: Option<u32>) -> Result<Vec<AdminDraw>, StoreError> {
        self.ensure_online()?;
        let mut draws: Vec<AdminDraw> = self
            .admin_draws
            .read()
            .await
            .iter()
            .filter(|draw| room_id.is_none_or(|room| draw.room_id == room))
            .cloned()
            .collect();
        draws.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(draws)
    }
}
