//! Drawn outcomes and the generators that produce them.

use std::collections::HashMap;

use chrono::{DateTime, Days, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::selection::{Color, Digit, Selection, Size};
use crate::clock::{PeriodId, RoundTrack};
use crate::config::DrawConfig;

/// Result drawn for one round of one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub track: String,
    pub period: PeriodId,
    #[serde(rename = "number")]
    pub drawn_number: Digit,
    pub colors: Vec<Color>,
    pub big_small: Size,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Outcome {
    /// Classifies `drawn_number` and stamps it with round metadata.
    pub fn new(
        track: &RoundTrack,
        period: PeriodId,
        drawn_number: Digit,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            track: track.label.clone(),
            period,
            drawn_number,
            colors: colors_for(drawn_number),
            big_small: size_for(drawn_number),
            timestamp,
        }
    }
}

/// Colors a drawn number counts as. 0 and 5 carry violet as well.
pub fn colors_for(digit: Digit) -> Vec<Color> {
    match digit.value() {
        0 => vec![Color::Red, Color::Violet],
        5 => vec![Color::Green, Color::Violet],
        1 | 3 | 7 | 9 => vec![Color::Green],
        _ => vec![Color::Red],
    }
}

pub fn size_for(digit: Digit) -> Size {
    if digit.value() >= 5 {
        Size::Big
    } else {
        Size::Small
    }
}

/// Numbers the draw may produce given the player's selection.
///
/// These sets restrict the draw only. They are not the winning sets for a
/// color: settlement judges wins through [`colors_for`].
pub fn allowed_draw_set(selection: Option<Selection>) -> Vec<Digit> {
    let pick = |values: &[u8]| -> Vec<Digit> {
        values.iter().filter_map(|v| Digit::new(*v)).collect()
    };

    match selection {
        None => Digit::ALL.to_vec(),
        Some(Selection::Color(Color::Red)) => pick(&[1, 3, 5, 6, 9]),
        Some(Selection::Color(Color::Green)) => pick(&[0, 2, 4, 6, 8]),
        Some(Selection::Color(Color::Violet)) => pick(&[1, 2, 3, 4, 6, 7, 8, 9]),
        Some(Selection::Size(Size::Big)) => pick(&[0, 1, 2, 3, 4]),
        Some(Selection::Size(Size::Small)) => pick(&[5, 6, 7, 8, 9]),
        Some(Selection::Number(chosen)) => Digit::ALL
            .iter()
            .copied()
            .filter(|digit| *digit != chosen)
            .collect(),
    }
}

/// Source of round outcomes.
///
/// The scheduler draws through this trait so per-client drawing can be
/// swapped for a central authority without touching the state machine.
pub trait OutcomeGenerator: Send {
    /// Produces the outcome for `period` on `track`.
    fn generate(
        &mut self,
        track: &RoundTrack,
        period: PeriodId,
        selection: Option<Selection>,
        now: DateTime<Utc>,
    ) -> Outcome;
}

/// Uniform draw from the allowed set of the selection.
#[derive(Debug, Clone)]
pub struct RandomOutcomeGenerator {
    rng: ChaCha8Rng,
}

impl RandomOutcomeGenerator {
    /// Creates a generator seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    /// Creates a reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &DrawConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Picks one number uniformly from the selection's allowed set.
    pub fn draw_number(&mut self, selection: Option<Selection>) -> Digit {
        let allowed = allowed_draw_set(selection);
        let index = self.rng.random_range(0..allowed.len());
        allowed[index]
    }
}

impl OutcomeGenerator for RandomOutcomeGenerator {
    fn generate(
        &mut self,
        track: &RoundTrack,
        period: PeriodId,
        selection: Option<Selection>,
        now: DateTime<Utc>,
    ) -> Outcome {
        let drawn = self.draw_number(selection);
        tracing::debug!(track = %track.label, %period, number = %drawn, "Outcome drawn");
        Outcome::new(track, period, drawn, now)
    }
}

/// At most one draw per `(track, period)`; repeated requests get the first outcome.
///
/// Entries older than the previous day are dropped as new periods arrive.
#[derive(Debug)]
pub struct MemoizedOutcomeGenerator<G> {
    inner: G,
    drawn: HashMap<(String, PeriodId), Outcome>,
}

impl<G: OutcomeGenerator> MemoizedOutcomeGenerator<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            drawn: HashMap::new(),
        }
    }

    /// Outcome already drawn for this round, if any.
    pub fn get(&self, track_label: &str, period: PeriodId) -> Option<&Outcome> {
        self.drawn.get(&(track_label.to_string(), period))
    }

    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }

    fn prune_before(&mut self, period: PeriodId) {
        if let Some(cutoff) = period.date().checked_sub_days(Days::new(1)) {
            self.drawn.retain(|(_, kept), _| kept.date() >= cutoff);
        }
    }
}

impl<G: OutcomeGenerator> OutcomeGenerator for MemoizedOutcomeGenerator<G> {
    fn generate(
        &mut self,
        track: &RoundTrack,
        period: PeriodId,
        selection: Option<Selection>,
        now: DateTime<Utc>,
    ) -> Outcome {
        let key = (track.label.clone(), period);
        if let Some(existing) = self.drawn.get(&key) {
            return existing.clone();
        }

        self.prune_before(period);
        let outcome = self.inner.generate(track, period, selection, now);
        self.drawn.insert(key, outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::TimeZone;

    use super::*;

    fn digit(value: u8) -> Digit {
        Digit::new(value).unwrap()
    }

    fn track() -> RoundTrack {
        RoundTrack::new("1min", 60)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_colors_classification() {
        assert_eq!(colors_for(digit(0)), vec![Color::Red, Color::Violet]);
        assert_eq!(colors_for(digit(5)), vec![Color::Green, Color::Violet]);
        for value in [1, 3, 7, 9] {
            assert_eq!(colors_for(digit(value)), vec![Color::Green]);
        }
        for value in [2, 4, 6, 8] {
            assert_eq!(colors_for(digit(value)), vec![Color::Red]);
        }
    }

    #[test]
    fn test_size_classification() {
        for value in 0..5 {
            assert_eq!(size_for(digit(value)), Size::Small);
        }
        for value in 5..10 {
            assert_eq!(size_for(digit(value)), Size::Big);
        }
    }

    #[test]
    fn test_allowed_set_excludes_chosen_number() {
        let allowed = allowed_draw_set(Some(Selection::Number(digit(4))));
        assert_eq!(allowed.len(), 9);
        assert!(!allowed.contains(&digit(4)));
    }

    #[test]
    fn test_allowed_set_without_selection_is_full_range() {
        assert_eq!(allowed_draw_set(None), Digit::ALL.to_vec());
    }

    #[test]
    fn test_green_draws_stay_in_allowed_set() {
        let mut generator = RandomOutcomeGenerator::seeded(7);
        let allowed: HashSet<u8> = [0, 2, 4, 6, 8].into_iter().collect();
        for _ in 0..1000 {
            let drawn = generator.draw_number(Some(Selection::Color(Color::Green)));
            assert!(allowed.contains(&drawn.value()), "drew {drawn}");
        }
    }

    #[test]
    fn test_size_draws_stay_in_allowed_set() {
        let mut generator = RandomOutcomeGenerator::seeded(11);
        for _ in 0..500 {
            assert!(generator.draw_number(Some(Selection::Size(Size::Big))).value() < 5);
            assert!(generator.draw_number(Some(Selection::Size(Size::Small))).value() >= 5);
        }
    }

    #[test]
    fn test_seeded_generators_are_reproducible() {
        let mut first = RandomOutcomeGenerator::seeded(99);
        let mut second = RandomOutcomeGenerator::seeded(99);
        for _ in 0..50 {
            assert_eq!(first.draw_number(None), second.draw_number(None));
        }
    }

    #[test]
    fn test_outcome_derives_classification() {
        let period = PeriodId::first_of_day(now().date_naive());
        let outcome = Outcome::new(&track(), period, digit(0), now());
        assert_eq!(outcome.colors, vec![Color::Red, Color::Violet]);
        assert_eq!(outcome.big_small, Size::Small);
        assert_eq!(outcome.track, "1min");
    }

    #[test]
    fn test_memoized_generator_draws_once_per_round() {
        let mut generator = MemoizedOutcomeGenerator::new(RandomOutcomeGenerator::seeded(3));
        let period = PeriodId::first_of_day(now().date_naive());

        let first = generator.generate(&track(), period, None, now());
        for _ in 0..20 {
            let again = generator.generate(
                &track(),
                period,
                Some(Selection::Color(Color::Red)),
                now() + chrono::Duration::seconds(5),
            );
            assert_eq!(again, first);
        }
        assert_eq!(generator.len(), 1);
        assert_eq!(generator.get("1min", period), Some(&first));
    }

    #[test]
    fn test_memoized_generator_separates_tracks_and_periods() {
        let mut generator = MemoizedOutcomeGenerator::new(RandomOutcomeGenerator::seeded(3));
        let period = PeriodId::first_of_day(now().date_naive());

        generator.generate(&track(), period, None, now());
        generator.generate(&track(), period.next().unwrap(), None, now());
        generator.generate(&RoundTrack::new("3min", 180), period, None, now());
        assert_eq!(generator.len(), 3);
    }

    #[test]
    fn test_outcome_json_uses_document_field_names() {
        let period = PeriodId::first_of_day(now().date_naive());
        let outcome = Outcome::new(&track(), period, digit(7), now());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["number"], 7);
        assert_eq!(json["bigSmall"], "big");
        assert_eq!(json["colors"][0], "green");
        assert_eq!(json["timestamp"], now().timestamp_millis());
    }
}
