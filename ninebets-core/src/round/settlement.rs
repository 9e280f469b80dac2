//! Win/loss judgement and history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::Outcome;
use super::selection::{Digit, Selection};

/// Settled result of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    Win,
    Loss,
}

impl std::fmt::Display for RoundResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundResult::Win => f.write_str("Win"),
            RoundResult::Loss => f.write_str("Loss"),
        }
    }
}

/// Append-only record of one settled bet, owned by the player's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub selected: Selection,
    pub draw_number: Digit,
    pub result: RoundResult,
}

/// Whether `selection` wins against `outcome`.
///
/// A number wins on an exact match, a color when the drawn number carries
/// that color, a size when it matches the drawn size.
pub fn is_win(selection: Selection, outcome: &Outcome) -> bool {
    match selection {
        Selection::Number(digit) => digit == outcome.drawn_number,
        Selection::Color(color) => outcome.colors.contains(&color),
        Selection::Size(size) => size == outcome.big_small,
    }
}

/// Builds the history record for a finished round.
///
/// Returns `None` unless there is an outcome, a selection and a non-zero bid.
pub fn settle(
    selection: Option<Selection>,
    bid: u64,
    outcome: Option<&Outcome>,
    now: DateTime<Utc>,
) -> Option<HistoryRecord> {
    let (selection, outcome) = (selection?, outcome?);
    if bid == 0 {
        return None;
    }

    let result = if is_win(selection, outcome) {
        RoundResult::Win
    } else {
        RoundResult::Loss
    };

    Some(HistoryRecord {
        timestamp: now,
        selected: selection,
        draw_number: outcome.drawn_number,
        result,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::clock::{PeriodId, RoundTrack};
    use crate::round::selection::{Color, Size};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 16, 12, 0, 0).unwrap()
    }

    fn outcome(value: u8) -> Outcome {
        Outcome::new(
            &RoundTrack::new("1min", 60),
            PeriodId::first_of_day(now().date_naive()),
            Digit::new(value).unwrap(),
            now(),
        )
    }

    fn selection(text: &str) -> Selection {
        text.parse().unwrap()
    }

    #[test]
    fn test_win_rule_cases() {
        assert!(is_win(selection("3"), &outcome(3)));
        assert!(is_win(selection("red"), &outcome(2)));
        assert!(is_win(selection("red"), &outcome(0)));
        assert!(is_win(selection("violet"), &outcome(0)));
        assert!(is_win(selection("big"), &outcome(7)));
        assert!(!is_win(selection("small"), &outcome(7)));
        assert!(!is_win(selection("4"), &outcome(3)));
        assert!(!is_win(selection("green"), &outcome(8)));
    }

    #[test]
    fn test_settle_records_win() {
        let record = settle(Some(Selection::Size(Size::Big)), 100, Some(&outcome(7)), now()).unwrap();
        assert_eq!(record.result, RoundResult::Win);
        assert_eq!(record.draw_number.value(), 7);
        assert_eq!(record.selected, Selection::Size(Size::Big));
    }

    #[test]
    fn test_settle_records_loss() {
        let record = settle(
            Some(Selection::Color(Color::Green)),
            10,
            Some(&outcome(2)),
            now(),
        )
        .unwrap();
        assert_eq!(record.result, RoundResult::Loss);
    }

    #[test]
    fn test_settle_requires_bid_selection_and_outcome() {
        assert!(settle(Some(selection("red")), 0, Some(&outcome(2)), now()).is_none());
        assert!(settle(None, 100, Some(&outcome(2)), now()).is_none());
        assert!(settle(Some(selection("red")), 100, None, now()).is_none());
    }

    #[test]
    fn test_history_record_json_shape() {
        let record = settle(Some(selection("3")), 5, Some(&outcome(3)), now()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["selected"], "3");
        assert_eq!(json["drawNumber"], 3);
        assert_eq!(json["result"], "Win");
    }
}
