//! Outcome and settlement engine.
//!
//! Selections, the draw with its per-selection restrictions, color and size
//! classification, and the win rule applied at settlement.

pub mod outcome;
pub mod selection;
pub mod settlement;

pub use outcome::{
    MemoizedOutcomeGenerator, Outcome, OutcomeGenerator, RandomOutcomeGenerator,
    allowed_draw_set, colors_for, size_for,
};
pub use selection::{Color, Digit, Selection, Size};
pub use settlement::{HistoryRecord, RoundResult, is_win, settle};

/// Errors related to bets and round progression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("Invalid selection: {input}")]
    InvalidSelection { input: String },

    #[error("Bets are locked for track {track}")]
    BettingLocked { track: String },

    #[error("Bid amount must be greater than zero")]
    ZeroBid,

    #[error("No round track at index {index}")]
    UnknownTrackIndex { index: usize },

    #[error("Round scheduler has shut down")]
    SchedulerShutdown,
}
