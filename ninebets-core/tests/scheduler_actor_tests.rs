//! Round scheduler actor driven against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ninebets_core::clock::{RoundTrack, TrackRemaining};
use ninebets_core::config::RoundConfig;
use ninebets_core::round::{Color, RandomOutcomeGenerator, RoundError, Selection};
use ninebets_core::scheduler::{RoundEvent, RoundScheduler, RoundSchedulerHandle};
use ninebets_core::store::{GameStore, HistorySink, InMemoryStore};
use ninebets_core::spawn_round_scheduler;
use tokio::sync::broadcast;

fn scheduler() -> RoundScheduler {
    RoundScheduler::new(
        vec![RoundTrack::new("1min", 60), RoundTrack::new("3min", 180)],
        &RoundConfig::default(),
        Box::new(RandomOutcomeGenerator::seeded(7)),
        Utc::now().date_naive(),
    )
    .unwrap()
}

async fn spawn_with_store(store: Arc<InMemoryStore>) -> RoundSchedulerHandle {
    store.create_user("alice").await.unwrap();
    let sink: Arc<dyn HistorySink> = store;
    spawn_round_scheduler(
        scheduler(),
        Duration::from_secs(1),
        sink,
        "alice".to_string(),
    )
}

async fn prime_round(handle: &RoundSchedulerHandle, remaining: u32) {
    handle
        .sync(vec![TrackRemaining {
            label: "1min".to_string(),
            remaining,
            period: None,
        }])
        .await
        .unwrap();
}

async fn wait_for_settlement(events: &mut broadcast::Receiver<RoundEvent>) -> RoundEvent {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match events.recv().await {
                Ok(event @ RoundEvent::Settled { .. }) => return event,
                Ok(_) => continue,
                Err(error) => panic!("event stream closed: {error}"),
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_settled_bet_is_written_to_history() {
    let store = Arc::new(InMemoryStore::new());
    let handle = spawn_with_store(store.clone()).await;
    let mut events = handle.subscribe();

    prime_round(&handle, 6).await;
    handle
        .place_bet(Selection::Color(Color::Red), 100)
        .await
        .unwrap();

    let settled = wait_for_settlement(&mut events).await;
    assert!(matches!(
        settled,
        RoundEvent::Settled {
            record: Some(_),
            ..
        }
    ));

    let mut history = Vec::new();
    for _ in 0..50 {
        history = store.history("alice").await.unwrap();
        if !history.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].selected, Selection::Color(Color::Red));
    assert_eq!(store.recent_draws(5).await.unwrap().len(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_bet_after_lock_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let handle = spawn_with_store(store).await;
    let mut events = handle.subscribe();

    prime_round(&handle, 6).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(RoundEvent::LockWindowOpened { .. }) = events.recv().await {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(
        handle.place_bet(Selection::Color(Color::Green), 10).await,
        Err(RoundError::BettingLocked {
            track: "1min".to_string()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_store_outage_does_not_stop_rounds() {
    let store = Arc::new(InMemoryStore::new());
    let handle = spawn_with_store(store.clone()).await;
    let mut events = handle.subscribe();

    store.go_offline();
    prime_round(&handle, 6).await;
    handle
        .place_bet(Selection::Color(Color::Violet), 20)
        .await
        .unwrap();
    wait_for_settlement(&mut events).await;

    // the round after the outage still starts
    let started = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(RoundEvent::RoundStarted { .. }) = events.recv().await {
                return true;
            }
        }
    })
    .await
    .unwrap();
    assert!(started);

    store.go_online();
    assert!(store.history("alice").await.unwrap().is_empty());
    assert!(handle.snapshot().await.unwrap().running);
}

#[tokio::test(start_paused = true)]
async fn test_track_switch_and_sync() {
    let store = Arc::new(InMemoryStore::new());
    let handle = spawn_with_store(store).await;

    handle.select_track(1).await.unwrap();
    handle
        .sync(vec![TrackRemaining {
            label: "3min".to_string(),
            remaining: 90,
            period: None,
        }])
        .await
        .unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.active, 1);
    assert!(snapshot.tracks[1].remaining <= 90);
    assert!(snapshot.tracks[1].remaining >= 89);
    assert!(snapshot.tracks[0].remaining >= 59);

    assert_eq!(
        handle.select_track(4).await,
        Err(RoundError::UnknownTrackIndex { index: 4 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_commands_fail_after_shutdown() {
    let store = Arc::new(InMemoryStore::new());
    let handle = spawn_with_store(store).await;

    handle.shutdown().await.unwrap();
    tokio::task::yield_now().await;

    assert_eq!(
        handle.place_bet(Selection::Color(Color::Red), 5).await,
        Err(RoundError::SchedulerShutdown)
    );
}

#[tokio::test(start_paused = true)]
async fn test_resync_into_lock_window_keeps_bet() {
    let store = Arc::new(InMemoryStore::new());
    let handle = spawn_with_store(store.clone()).await;
    let mut events = handle.subscribe();

    prime_round(&handle, 20).await;
    handle
        .place_bet(Selection::Color(Color::Red), 40)
        .await
        .unwrap();
    prime_round(&handle, 4).await;

    let settled = wait_for_settlement(&mut events).await;
    assert!(matches!(
        settled,
        RoundEvent::Settled {
            record: Some(_),
            ..
        }
    ));

    let mut history = Vec::new();
    for _ in 0..50 {
        history = store.history("alice").await.unwrap();
        if !history.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].selected, Selection::Color(Color::Red));
}
