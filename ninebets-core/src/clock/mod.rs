//! Shared round clock.
//!
//! Every track's countdown is derived from one epoch owned by the serving
//! process. The epoch is only mutated by [`RoundClock::reset`], which moves
//! all tracks at once.

pub mod period;
pub mod track;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub use period::{PeriodError, PeriodId};
pub use track::RoundTrack;

/// Errors raised by clock queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("No round tracks configured")]
    NoTracks,

    #[error("Track {label} has a zero-length period")]
    ZeroPeriod { label: String },

    #[error("Unknown round track: {label}")]
    UnknownTrack { label: String },
}

/// Remaining time of one track at a single instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRemaining {
    pub label: String,
    pub remaining: u32,
    /// Round in progress on this track, when the clock could derive one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodId>,
}

/// Seconds left in the current round of a track.
///
/// `remaining = period - (elapsed_secs mod period)`, so a zero elapsed time
/// yields the full period and the result never drops below 1 for a
/// non-zero period. Instants before the epoch count as zero elapsed.
pub fn remaining_seconds(epoch: DateTime<Utc>, period_seconds: u32, now: DateTime<Utc>) -> u32 {
    if period_seconds == 0 {
        return 0;
    }
    let offset = elapsed_seconds(epoch, now) % u64::from(period_seconds);
    // offset < period_seconds, so the cast is lossless
    period_seconds - offset as u32
}

fn elapsed_seconds(epoch: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let elapsed_ms = (now - epoch).num_milliseconds().max(0);
    (elapsed_ms / 1000) as u64
}

/// Process-wide round clock shared by all tracks.
#[derive(Debug)]
pub struct RoundClock {
    tracks: Vec<RoundTrack>,
    epoch: RwLock<DateTime<Utc>>,
}

impl RoundClock {
    /// Creates a clock whose universal cycle starts at `epoch`.
    ///
    /// # Errors
    ///
    /// - `ClockError::NoTracks` - Track list is empty
    /// - `ClockError::ZeroPeriod` - A track has a zero-length period
    pub fn new(tracks: Vec<RoundTrack>, epoch: DateTime<Utc>) -> Result<Self, ClockError> {
        if tracks.is_empty() {
            return Err(ClockError::NoTracks);
        }
        if let Some(track) = tracks.iter().find(|track| track.period_seconds == 0) {
            return Err(ClockError::ZeroPeriod {
                label: track.label.clone(),
            });
        }

        Ok(Self {
            tracks,
            epoch: RwLock::new(epoch),
        })
    }

    pub fn tracks(&self) -> &[RoundTrack] {
        &self.tracks
    }

    /// Current epoch of the universal cycle.
    pub fn epoch(&self) -> DateTime<Utc> {
        *self.epoch.read()
    }

    /// Looks up a configured track by label.
    ///
    /// # Errors
    ///
    /// - `ClockError::UnknownTrack` - No track carries this label
    pub fn track(&self, label: &str) -> Result<&RoundTrack, ClockError> {
        self.tracks
            .iter()
            .find(|track| track.label == label)
            .ok_or_else(|| ClockError::UnknownTrack {
                label: label.to_string(),
            })
    }

    /// Seconds left in the current round of `track` at `now`.
    pub fn remaining(&self, track: &RoundTrack, now: DateTime<Utc>) -> u32 {
        remaining_seconds(self.epoch(), track.period_seconds, now)
    }

    /// Restarts the universal cycle at `now` for every track.
    pub fn reset(&self, now: DateTime<Utc>) {
        *self.epoch.write() = now;
        tracing::info!(epoch = %now, "Round clock reset");
    }

    /// Remaining time of all tracks computed against a single epoch read.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<TrackRemaining> {
        let epoch = self.epoch();
        self.tracks
            .iter()
            .map(|track| TrackRemaining {
                label: track.label.clone(),
                remaining: remaining_seconds(epoch, track.period_seconds, now),
                period: period_at(epoch, track, now).ok(),
            })
            .collect()
    }

    /// Identifier of the round in progress on `track` at `now`.
    ///
    /// # Errors
    ///
    /// - `PeriodError::SequenceOverflow` - More rounds in the day than four digits allow
    pub fn period(&self, track: &RoundTrack, now: DateTime<Utc>) -> Result<PeriodId, PeriodError> {
        period_at(self.epoch(), track, now)
    }
}

/// Counts rounds begun since the start of `now`'s UTC day, or since the
/// epoch if it is later, 1-based.
fn period_at(
    epoch: DateTime<Utc>,
    track: &RoundTrack,
    now: DateTime<Utc>,
) -> Result<PeriodId, PeriodError> {
    let period = u64::from(track.period_seconds.max(1));
    let today = now.date_naive();
    let day_start = today.and_time(chrono::NaiveTime::MIN).and_utc();

    let round_now = elapsed_seconds(epoch, now) / period;
    let round_at_day_start = if day_start > epoch {
        elapsed_seconds(epoch, day_start) / period
    } else {
        0
    };

    let index = round_now.saturating_sub(round_at_day_start) + 1;
    let index = u32::try_from(index).map_err(|_| PeriodError::SequenceOverflow { date: today })?;
    PeriodId::for_index(today, index)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    use super::*;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 16, 9, 30, 0).unwrap()
    }

    fn clock() -> RoundClock {
        RoundClock::new(
            vec![
                RoundTrack::new("1min", 60),
                RoundTrack::new("3min", 180),
                RoundTrack::new("5min", 300),
                RoundTrack::new("10min", 600),
            ],
            epoch(),
        )
        .unwrap()
    }

    #[test]
    fn test_remaining_at_epoch_is_full_period() {
        let clock = clock();
        for track in clock.tracks() {
            assert_eq!(clock.remaining(track, epoch()), track.period_seconds);
        }
    }

    #[test]
    fn test_remaining_counts_down_and_wraps() {
        let clock = clock();
        let track = clock.track("1min").unwrap().clone();
        assert_eq!(clock.remaining(&track, epoch() + Duration::seconds(1)), 59);
        assert_eq!(clock.remaining(&track, epoch() + Duration::seconds(59)), 1);
        assert_eq!(clock.remaining(&track, epoch() + Duration::seconds(60)), 60);
        assert_eq!(
            clock.remaining(&track, epoch() + Duration::milliseconds(1999)),
            59
        );
    }

    #[test]
    fn test_remaining_before_epoch_is_full_period() {
        let clock = clock();
        let track = clock.track("3min").unwrap().clone();
        assert_eq!(clock.remaining(&track, epoch() - Duration::seconds(30)), 180);
    }

    #[test]
    fn test_reset_restarts_every_track() {
        let clock = clock();
        let later = epoch() + Duration::seconds(437);
        clock.reset(later);

        let snapshot = clock.snapshot(later);
        assert_eq!(snapshot.len(), 4);
        for (entry, track) in snapshot.iter().zip(clock.tracks()) {
            assert_eq!(entry.label, track.label);
            assert_eq!(entry.remaining, track.period_seconds);
        }
    }

    #[test]
    fn test_unknown_track_lookup() {
        let clock = clock();
        assert_eq!(
            clock.track("2min"),
            Err(ClockError::UnknownTrack {
                label: "2min".to_string()
            })
        );
    }

    #[test]
    fn test_new_rejects_invalid_tracks() {
        assert_eq!(
            RoundClock::new(vec![], epoch()).unwrap_err(),
            ClockError::NoTracks
        );
        assert!(matches!(
            RoundClock::new(vec![RoundTrack::new("bad", 0)], epoch()),
            Err(ClockError::ZeroPeriod { .. })
        ));
    }

    #[test]
    fn test_period_counts_rounds_since_epoch() {
        let clock = clock();
        let track = clock.track("1min").unwrap().clone();
        assert_eq!(
            clock.period(&track, epoch()).unwrap().to_string(),
            "202410160001"
        );
        assert_eq!(
            clock
                .period(&track, epoch() + Duration::seconds(125))
                .unwrap()
                .to_string(),
            "202410160003"
        );
    }

    #[test]
    fn test_period_restarts_at_midnight() {
        let clock = clock();
        let track = clock.track("10min").unwrap().clone();
        let after_midnight = Utc.with_ymd_and_hms(2024, 10, 17, 0, 0, 30).unwrap();
        let period = clock.period(&track, after_midnight).unwrap();
        assert_eq!(period.to_string(), "202410170001");
    }

    proptest! {
        #[test]
        fn prop_remaining_within_period(offset_ms in 0i64..10_000_000, track_index in 0usize..4) {
            let clock = clock();
            let track = clock.tracks()[track_index].clone();
            let remaining = clock.remaining(&track, epoch() + Duration::milliseconds(offset_ms));
            prop_assert!(remaining >= 1);
            prop_assert!(remaining <= track.period_seconds);
        }

        #[test]
        fn prop_reset_yields_full_periods(offset_ms in 0i64..10_000_000) {
            let clock = clock();
            let now = epoch() + Duration::milliseconds(offset_ms);
            clock.reset(now);
            for track in clock.tracks() {
                prop_assert_eq!(clock.remaining(track, now), track.period_seconds);
            }
        }
    }
}
