//! Handle for communicating with the round scheduler actor.

use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::SchedulerCommand;
use super::core::{RoundEvent, SchedulerSnapshot};
use crate::clock::TrackRemaining;
use crate::round::{RoundError, Selection};

/// Cloneable handle to a running scheduler actor.
#[derive(Clone)]
pub struct RoundSchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
    events: broadcast::Sender<RoundEvent>,
}

impl RoundSchedulerHandle {
    pub(super) fn new(
        sender: mpsc::Sender<SchedulerCommand>,
        events: broadcast::Sender<RoundEvent>,
    ) -> Self {
        Self { sender, events }
    }

    /// Subscribes to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// Places a bet on the active track.
    ///
    /// # Errors
    /// - `RoundError::ZeroBid` - `bid` is zero
    /// - `RoundError::BettingLocked` - Lock window already open
    /// - `RoundError::SchedulerShutdown` - Actor no longer running
    pub async fn place_bet(&self, selection: Selection, bid: u64) -> Result<(), RoundError> {
        let (responder, rx) = oneshot::channel();
        self.send(SchedulerCommand::PlaceBet {
            selection,
            bid,
            responder,
        })
        .await?;
        rx.await.map_err(|_| RoundError::SchedulerShutdown)?
    }

    /// Switches the active track.
    ///
    /// # Errors
    /// - `RoundError::UnknownTrackIndex` - No track at `index`
    /// - `RoundError::SchedulerShutdown` - Actor no longer running
    pub async fn select_track(&self, index: usize) -> Result<(), RoundError> {
        let (responder, rx) = oneshot::channel();
        self.send(SchedulerCommand::SelectTrack { index, responder })
            .await?;
        rx.await.map_err(|_| RoundError::SchedulerShutdown)?
    }

    /// Applies a clock snapshot to the countdowns.
    ///
    /// # Errors
    /// - `RoundError::SchedulerShutdown` - Actor no longer running
    pub async fn sync(&self, timers: Vec<TrackRemaining>) -> Result<(), RoundError> {
        let (responder, rx) = oneshot::channel();
        self.send(SchedulerCommand::Sync { timers, responder })
            .await?;
        rx.await.map_err(|_| RoundError::SchedulerShutdown)
    }

    /// # Errors
    /// - `RoundError::SchedulerShutdown` - Actor no longer running
    pub async fn snapshot(&self) -> Result<SchedulerSnapshot, RoundError> {
        let (responder, rx) = oneshot::channel();
        self.send(SchedulerCommand::Snapshot { responder }).await?;
        rx.await.map_err(|_| RoundError::SchedulerShutdown)
    }

    /// Stops the actor and waits for it to acknowledge.
    ///
    /// # Errors
    /// - `RoundError::SchedulerShutdown` - Actor already gone
    pub async fn shutdown(&self) -> Result<(), RoundError> {
        let (responder, rx) = oneshot::channel();
        self.send(SchedulerCommand::Shutdown { responder }).await?;
        rx.await.map_err(|_| RoundError::SchedulerShutdown)
    }

    async fn send(&self, command: SchedulerCommand) -> Result<(), RoundError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoundError::SchedulerShutdown)
    }
}
