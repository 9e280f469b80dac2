//! Ninebets Core - round clock, scheduler and settlement
//!
//! This crate provides the game core of a color/number prediction game:
//! a shared round clock, the per-track round scheduler, draw generation and
//! settlement, the persistence contract, and wallet operations.

pub mod admin;
pub mod clock;
pub mod config;
pub mod round;
pub mod scheduler;
pub mod store;
pub mod tracing_setup;
pub mod wallet;

// Re-export main types for convenient access
pub use admin::{AdminDrawError, AdminDrawRequest};
pub use clock::{ClockError, PeriodError, PeriodId, RoundClock, RoundTrack, TrackRemaining};
pub use config::NinebetsConfig;
pub use round::{HistoryRecord, Outcome, RoundError, RoundResult, Selection};
pub use scheduler::{RoundPhase, RoundScheduler, RoundSchedulerHandle, spawn_round_scheduler};
pub use store::{GameStore, HistorySink, InMemoryStore, StoreError};
pub use wallet::{WalletError, WalletService};

/// Errors that can bubble up from any Ninebets subsystem.
#[derive(Debug, thiserror::Error)]
pub enum NinebetsError {
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("Period error: {0}")]
    Period(#[from] PeriodError),

    #[error("Round error: {0}")]
    Round(#[from] RoundError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Admin draw error: {0}")]
    AdminDraw(#[from] AdminDrawError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NinebetsError {
    /// Returns a user-friendly error message suitable for a notification.
    pub fn user_message(&self) -> String {
        match self {
            NinebetsError::Wallet(WalletError::Store(e)) | NinebetsError::Store(e) => match e {
                StoreError::UserNotFound { .. } => "User not found".to_string(),
                StoreError::UserExists { .. } => "User already registered".to_string(),
                StoreError::DocumentNotFound { .. } => "Record not found".to_string(),
                StoreError::InsufficientFunds { .. } => "Insufficient balance".to_string(),
                StoreError::Unavailable { .. } => {
                    "Something went wrong, please try again".to_string()
                }
            },
            NinebetsError::Wallet(WalletError::InvalidAmount { .. }) => {
                "Please enter a valid amount".to_string()
            }
            NinebetsError::Wallet(WalletError::InsufficientBalance { .. }) => {
                "Insufficient balance".to_string()
            }
            NinebetsError::Wallet(e) => e.to_string(),
            NinebetsError::AdminDraw(AdminDrawError::MissingField { .. }) => {
                "Please select all options".to_string()
            }
            NinebetsError::AdminDraw(e) => e.to_string(),
            NinebetsError::Round(RoundError::BettingLocked { .. }) => {
                "Time is up for this round".to_string()
            }
            NinebetsError::Round(e) => e.to_string(),
            NinebetsError::Clock(e) => e.to_string(),
            NinebetsError::Period(_) => "Round identifier unavailable".to_string(),
            NinebetsError::Configuration { .. } => "Configuration error occurred".to_string(),
            NinebetsError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            NinebetsError::Wallet(
                WalletError::InvalidAmount { .. }
                    | WalletError::InsufficientBalance { .. }
                    | WalletError::InvalidFilter { .. }
            ) | NinebetsError::AdminDraw(_)
                | NinebetsError::Round(
                    RoundError::InvalidSelection { .. }
                        | RoundError::BettingLocked { .. }
                        | RoundError::ZeroBid
                )
                | NinebetsError::Store(
                    StoreError::UserExists { .. } | StoreError::InsufficientFunds { .. }
                )
        )
    }

    /// Checks if this error means a record or user does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NinebetsError::Store(
                StoreError::UserNotFound { .. } | StoreError::DocumentNotFound { .. }
            ) | NinebetsError::Wallet(WalletError::Store(
                StoreError::UserNotFound { .. } | StoreError::DocumentNotFound { .. }
            )) | NinebetsError::Clock(ClockError::UnknownTrack { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, NinebetsError>;
