//! Command definitions for the round scheduler actor.

use tokio::sync::oneshot;

use super::core::SchedulerSnapshot;
use crate::clock::TrackRemaining;
use crate::round::{RoundError, Selection};

/// Commands that can be sent to the round scheduler actor.
///
/// Each command carries a response channel; the actor owns the scheduler and
/// applies commands between ticks, so no locking is needed.
pub enum SchedulerCommand {
    /// Place a bet on the active track.
    PlaceBet {
        selection: Selection,
        bid: u64,
        responder: oneshot::Sender<Result<(), RoundError>>,
    },
    /// Switch the active track.
    SelectTrack {
        index: usize,
        responder: oneshot::Sender<Result<(), RoundError>>,
    },
    /// Overwrite countdowns from a clock snapshot.
    Sync {
        timers: Vec<TrackRemaining>,
        responder: oneshot::Sender<()>,
    },
    /// Read the scheduler status.
    Snapshot {
        responder: oneshot::Sender<SchedulerSnapshot>,
    },
    /// Stop ticking and exit the actor loop.
    Shutdown { responder: oneshot::Sender<()> },
}
