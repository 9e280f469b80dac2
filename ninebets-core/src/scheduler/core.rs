//! Round scheduler state machine.
//!
//! One track is active at a time and counts down once per tick. The cycle
//! follows the clock: `period, ..., 2, 1, period`. Reaching the lock
//! threshold opens the lock window and stages the draw; reaching the settle
//! threshold settles the bet; the following tick starts the next round.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::clock::{PeriodId, RoundTrack, TrackRemaining};
use crate::config::RoundConfig;
use crate::round::{HistoryRecord, Outcome, OutcomeGenerator, RoundError, Selection, settle};

/// Phase of the round on one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Running,
    LockWindow,
    Settling,
}

/// Notifications emitted by [`RoundScheduler::tick`] and track switches.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    /// Bets locked; `staged` holds the draw when a selection was active.
    LockWindowOpened {
        track: String,
        period: PeriodId,
        staged: Option<Outcome>,
    },
    /// Advisory final countdown switched on or off.
    FinalCountdown { active: bool },
    /// Round settled; `record` is present when a bet qualified for history.
    Settled {
        track: String,
        period: PeriodId,
        record: Option<HistoryRecord>,
    },
    /// Countdown wrapped to a fresh round.
    RoundStarted { track: String, period: PeriodId },
}

/// Receives scheduler events synchronously as they happen.
pub trait RoundObserver: Send + Sync {
    fn on_event(&self, event: &RoundEvent);
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub remaining: u32,
    pub phase: RoundPhase,
    pub events: Vec<RoundEvent>,
}

/// Per-track view for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackView {
    pub label: String,
    pub remaining: u32,
    pub phase: RoundPhase,
    pub period: PeriodId,
    pub selection: Option<Selection>,
    pub bid: u64,
}

/// Scheduler status for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerSnapshot {
    pub active: usize,
    pub running: bool,
    pub final_countdown: bool,
    pub tracks: Vec<TrackView>,
}

#[derive(Debug)]
struct TrackState {
    track: RoundTrack,
    remaining: u32,
    phase: RoundPhase,
    period: PeriodId,
    selection: Option<Selection>,
    bid: u64,
    staged: Option<Outcome>,
}

impl TrackState {
    fn view(&self) -> TrackView {
        TrackView {
            label: self.track.label.clone(),
            remaining: self.remaining,
            phase: self.phase,
            period: self.period,
            selection: self.selection,
            bid: self.bid,
        }
    }
}

/// Per-client round scheduler.
pub struct RoundScheduler {
    tracks: Vec<TrackState>,
    active: usize,
    lock_threshold: u32,
    settle_threshold: u32,
    final_countdown_threshold: u32,
    final_countdown: bool,
    running: bool,
    generator: Box<dyn OutcomeGenerator>,
    observers: Vec<Arc<dyn RoundObserver>>,
}

impl std::fmt::Debug for RoundScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundScheduler")
            .field("tracks", &self.tracks)
            .field("active", &self.active)
            .field("final_countdown", &self.final_countdown)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl RoundScheduler {
    /// Creates a stopped scheduler with every track at its full period.
    ///
    /// # Errors
    ///
    /// - `RoundError::UnknownTrackIndex` - `tracks` is empty
    pub fn new(
        tracks: Vec<RoundTrack>,
        config: &RoundConfig,
        generator: Box<dyn OutcomeGenerator>,
        today: NaiveDate,
    ) -> Result<Self, RoundError> {
        if tracks.is_empty() {
            return Err(RoundError::UnknownTrackIndex { index: 0 });
        }

        let tracks = tracks
            .into_iter()
            .map(|track| TrackState {
                remaining: track.period_seconds,
                track,
                phase: RoundPhase::Running,
                period: PeriodId::first_of_day(today),
                selection: None,
                bid: 0,
                staged: None,
            })
            .collect();

        Ok(Self {
            tracks,
            active: 0,
            lock_threshold: config.lock_threshold_secs,
            settle_threshold: config.settle_threshold_secs,
            final_countdown_threshold: config.final_countdown_secs,
            final_countdown: false,
            running: false,
            generator,
            observers: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: Arc<dyn RoundObserver>) {
        self.observers.push(observer);
    }

    pub fn start(&mut self) {
        self.running = true;
        tracing::debug!(track = %self.active_track().label, "Round scheduler started");
    }

    /// Stops ticking and clears the final countdown advisory.
    pub fn stop(&mut self) -> Vec<RoundEvent> {
        self.running = false;
        let mut events = Vec::new();
        self.set_final_countdown(false, &mut events);
        self.notify(&events);
        tracing::debug!("Round scheduler stopped");
        events
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_track(&self) -> &RoundTrack {
        &self.tracks[self.active].track
    }

    pub fn remaining(&self) -> u32 {
        self.tracks[self.active].remaining
    }

    pub fn phase(&self) -> RoundPhase {
        self.tracks[self.active].phase
    }

    pub fn final_countdown(&self) -> bool {
        self.final_countdown
    }

    /// Outcome staged for the active round, if any.
    pub fn staged_outcome(&self) -> Option<&Outcome> {
        self.tracks[self.active].staged.as_ref()
    }

    /// Whether bets on the active track are locked.
    pub fn is_locked(&self) -> bool {
        self.phase() != RoundPhase::Running
    }

    /// Switches the active track. The clock-derived countdowns are untouched.
    ///
    /// # Errors
    ///
    /// - `RoundError::UnknownTrackIndex` - No track at `index`
    pub fn select_track(&mut self, index: usize) -> Result<Vec<RoundEvent>, RoundError> {
        if index >= self.tracks.len() {
            return Err(RoundError::UnknownTrackIndex { index });
        }
        self.active = index;

        let mut events = Vec::new();
        self.set_final_countdown(false, &mut events);
        self.notify(&events);
        tracing::debug!(track = %self.active_track().label, "Active track switched");
        Ok(events)
    }

    /// Sets or replaces the selection on the active track.
    ///
    /// # Errors
    ///
    /// - `RoundError::BettingLocked` - Lock window already open
    pub fn select(&mut self, selection: Selection) -> Result<(), RoundError> {
        self.ensure_open()?;
        self.tracks[self.active].selection = Some(selection);
        Ok(())
    }

    /// Sets the bid amount on the active track.
    ///
    /// # Errors
    ///
    /// - `RoundError::BettingLocked` - Lock window already open
    pub fn set_bid(&mut self, bid: u64) -> Result<(), RoundError> {
        self.ensure_open()?;
        self.tracks[self.active].bid = bid;
        Ok(())
    }

    /// Places a complete bet on the active track.
    ///
    /// # Errors
    ///
    /// - `RoundError::ZeroBid` - `bid` is zero
    /// - `RoundError::BettingLocked` - Lock window already open
    pub fn place_bet(&mut self, selection: Selection, bid: u64) -> Result<(), RoundError> {
        if bid == 0 {
            return Err(RoundError::ZeroBid);
        }
        self.ensure_open()?;
        let state = &mut self.tracks[self.active];
        state.selection = Some(selection);
        state.bid = bid;
        tracing::debug!(track = %state.track.label, %selection, bid, "Bet placed");
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), RoundError> {
        if self.is_locked() {
            return Err(RoundError::BettingLocked {
                track: self.active_track().label.clone(),
            });
        }
        Ok(())
    }

    /// Overwrites countdowns from a clock snapshot without firing events.
    ///
    /// Entries are matched by label; unknown labels are ignored. A jump from
    /// an open round into the lock window stages the draw for a pending
    /// selection, and a jump past the settle threshold keeps the round locked
    /// so the next tick still settles it.
    pub fn sync(&mut self, timers: &[TrackRemaining], now: DateTime<Utc>) {
        for timer in timers {
            let Some(index) = self
                .tracks
                .iter()
                .position(|state| state.track.label == timer.label)
            else {
                continue;
            };

            let state = &mut self.tracks[index];
            let was_open = state.phase == RoundPhase::Running;
            let unsettled = state.phase != RoundPhase::Settling;

            state.remaining = timer.remaining.clamp(1, state.track.period_seconds);
            state.phase = if state.remaining > self.lock_threshold {
                RoundPhase::Running
            } else if state.remaining > self.settle_threshold
                || (unsettled && state.selection.is_some())
            {
                RoundPhase::LockWindow
            } else {
                RoundPhase::Settling
            };
            if let Some(period) = timer.period {
                state.period = period;
            }

            let phase = state.phase;
            if phase == RoundPhase::Running {
                state.staged = None;
            } else if phase == RoundPhase::LockWindow && was_open && state.staged.is_none() {
                let staged = self.draw_for(index, now);
                if staged.is_some() {
                    tracing::debug!(track = %timer.label, "Draw staged after sync");
                }
                self.tracks[index].staged = staged;
            }
        }
    }

    /// Advances the active track by one second.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut events = Vec::new();
        if self.running {
            self.advance_active(now, &mut events);
            self.notify(&events);
        }

        TickReport {
            remaining: self.remaining(),
            phase: self.phase(),
            events,
        }
    }

    fn advance_active(&mut self, now: DateTime<Utc>, events: &mut Vec<RoundEvent>) {
        let index = self.active;

        if self.tracks[index].phase == RoundPhase::Settling {
            let state = &mut self.tracks[index];
            state.remaining = state.track.period_seconds;
            state.phase = RoundPhase::Running;
            state.period = state
                .period
                .next_for_date(now.date_naive())
                .unwrap_or_else(|error| {
                    tracing::warn!(%error, "Period sequence exhausted, restarting");
                    PeriodId::first_of_day(now.date_naive())
                });
            tracing::debug!(track = %state.track.label, period = %state.period, "Round started");
            events.push(RoundEvent::RoundStarted {
                track: state.track.label.clone(),
                period: state.period,
            });
            return;
        }

        let remaining = self.tracks[index].remaining.saturating_sub(1).max(1);
        self.tracks[index].remaining = remaining;

        if remaining == self.lock_threshold && self.tracks[index].phase == RoundPhase::Running {
            self.open_lock_window(index, now, events);
        }

        if remaining <= self.settle_threshold {
            self.set_final_countdown(false, events);
            self.settle_round(index, now, events);
        } else if remaining <= self.final_countdown_threshold {
            self.set_final_countdown(true, events);
        }
    }

    fn open_lock_window(&mut self, index: usize, now: DateTime<Utc>, events: &mut Vec<RoundEvent>) {
        let staged = self.draw_for(index, now);
        let state = &mut self.tracks[index];
        state.phase = RoundPhase::LockWindow;
        state.staged = staged.clone();

        tracing::debug!(
            track = %state.track.label,
            period = %state.period,
            staged = staged.is_some(),
            "Lock window opened"
        );
        events.push(RoundEvent::LockWindowOpened {
            track: state.track.label.clone(),
            period: state.period,
            staged,
        });
    }

    /// Draws the outcome for the track's pending selection, if it has one.
    fn draw_for(&mut self, index: usize, now: DateTime<Utc>) -> Option<Outcome> {
        let state = &self.tracks[index];
        let selection = state.selection?;
        Some(
            self.generator
                .generate(&state.track, state.period, Some(selection), now),
        )
    }

    fn settle_round(&mut self, index: usize, now: DateTime<Utc>, events: &mut Vec<RoundEvent>) {
        let state = &mut self.tracks[index];
        state.phase = RoundPhase::Settling;

        let record = settle(state.selection, state.bid, state.staged.as_ref(), now);
        state.selection = None;
        state.staged = None;

        match &record {
            Some(record) => tracing::info!(
                track = %state.track.label,
                period = %state.period,
                selected = %record.selected,
                drawn = %record.draw_number,
                result = %record.result,
                "Round settled"
            ),
            None => tracing::debug!(track = %state.track.label, "Round settled without a bet"),
        }

        events.push(RoundEvent::Settled {
            track: state.track.label.clone(),
            period: state.period,
            record,
        });
    }

    fn set_final_countdown(&mut self, active: bool, events: &mut Vec<RoundEvent>) {
        if self.final_countdown != active {
            self.final_countdown = active;
            events.push(RoundEvent::FinalCountdown { active });
        }
    }

    fn notify(&self, events: &[RoundEvent]) {
        for event in events {
            for observer in &self.observers {
                observer.on_event(event);
            }
        }
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            active: self.active,
            running: self.running,
            final_countdown: self.final_countdown,
            tracks: self.tracks.iter().map(TrackState::view).collect(),
        }
    }
}
