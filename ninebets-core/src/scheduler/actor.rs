//! Actor implementation for the round scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior};

use super::commands::SchedulerCommand;
use super::core::{RoundEvent, RoundScheduler};
use super::handle::RoundSchedulerHandle;
use crate::store::{DrawRecord, HistorySink};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// Spawns the scheduler as an actor ticking every `tick_interval`.
///
/// The scheduler is started before the first tick. Settled bets and staged
/// draws are written to `sink` on behalf of `user_id` as fire-and-forget
/// tasks; a failed write is logged and not retried.
pub fn spawn_round_scheduler(
    mut scheduler: RoundScheduler,
    tick_interval: Duration,
    sink: Arc<dyn HistorySink>,
    user_id: String,
) -> RoundSchedulerHandle {
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (events, _) = broadcast::channel(EVENT_BUFFER);

    scheduler.start();
    let actor_events = events.clone();
    tokio::spawn(async move {
        run_actor_loop(
            scheduler,
            tick_interval,
            receiver,
            actor_events,
            sink,
            user_id,
        )
        .await;
    });

    RoundSchedulerHandle::new(sender, events)
}

async fn run_actor_loop(
    mut scheduler: RoundScheduler,
    tick_interval: Duration,
    mut receiver: mpsc::Receiver<SchedulerCommand>,
    events: broadcast::Sender<RoundEvent>,
    sink: Arc<dyn HistorySink>,
    user_id: String,
) {
    tracing::debug!(track = %scheduler.active_track().label, "Round scheduler actor started");

    let mut ticker = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = scheduler.tick(Utc::now());
                dispatch(&report.events, &events, &sink, &user_id);
            }
            command = receiver.recv() => {
                let Some(command) = command else { break };
                if !handle_command(&mut scheduler, command, &events) {
                    break;
                }
            }
        }
    }

    let stop_events = scheduler.stop();
    publish(&stop_events, &events);
    tracing::debug!("Round scheduler actor stopped");
}

/// Applies one command. Returns false when the actor should exit.
fn handle_command(
    scheduler: &mut RoundScheduler,
    command: SchedulerCommand,
    events: &broadcast::Sender<RoundEvent>,
) -> bool {
    match command {
        SchedulerCommand::PlaceBet {
            selection,
            bid,
            responder,
        } => {
            let _ = responder.send(scheduler.place_bet(selection, bid));
        }
        SchedulerCommand::SelectTrack { index, responder } => {
            let result = scheduler.select_track(index).map(|switch_events| {
                publish(&switch_events, events);
            });
            let _ = responder.send(result);
        }
        SchedulerCommand::Sync { timers, responder } => {
            scheduler.sync(&timers, Utc::now());
            let _ = responder.send(());
        }
        SchedulerCommand::Snapshot { responder } => {
            let _ = responder.send(scheduler.snapshot());
        }
        SchedulerCommand::Shutdown { responder } => {
            let _ = responder.send(());
            return false;
        }
    }
    true
}

fn publish(batch: &[RoundEvent], events: &broadcast::Sender<RoundEvent>) {
    for event in batch {
        // No subscribers is fine
        let _ = events.send(event.clone());
    }
}

fn dispatch(
    batch: &[RoundEvent],
    events: &broadcast::Sender<RoundEvent>,
    sink: &Arc<dyn HistorySink>,
    user_id: &str,
) {
    publish(batch, events);

    for event in batch {
        match event {
            RoundEvent::LockWindowOpened {
                staged: Some(outcome),
                ..
            } => {
                let sink = Arc::clone(sink);
                let draw = DrawRecord::from(outcome);
                tokio::spawn(async move {
                    if let Err(error) = sink.record_draw(draw).await {
                        tracing::warn!(%error, "Failed to record draw");
                    }
                });
            }
            RoundEvent::Settled {
                record: Some(record),
                ..
            } => {
                let sink = Arc::clone(sink);
                let record = record.clone();
                let user_id = user_id.to_string();
                tokio::spawn(async move {
                    if let Err(error) = sink.append_history(&user_id, record).await {
                        tracing::warn!(%error, user_id = %user_id, "Failed to add history record");
                    }
                });
            }
            _ => {}
        }
    }
}
