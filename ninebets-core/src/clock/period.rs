//! Per-track, per-day round identifiers.
//!
//! A period is rendered as `YYYYMMDD` followed by a zero-padded four digit
//! sequence, e.g. `202410160007`. Identifiers are derived rather than stored:
//! the next period is always computable from the previous one.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest sequence representable in four digits.
pub const MAX_SEQUENCE: u16 = 9999;

const DATE_FORMAT: &str = "%Y%m%d";

/// Errors produced when parsing or advancing period identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("Malformed period identifier: {input}")]
    Malformed { input: String },

    #[error("Period sequence exhausted for {date}")]
    SequenceOverflow { date: NaiveDate },
}

/// Round identifier scoped to a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodId {
    date: NaiveDate,
    sequence: u16,
}

impl PeriodId {
    /// Builds the identifier for the `index`-th round of `date`.
    ///
    /// # Errors
    ///
    /// - `PeriodError::SequenceOverflow` - Index does not fit in four digits
    pub fn for_index(date: NaiveDate, index: u32) -> Result<Self, PeriodError> {
        let sequence = u16::try_from(index)
            .ok()
            .filter(|sequence| *sequence <= MAX_SEQUENCE)
            .ok_or(PeriodError::SequenceOverflow { date })?;
        Ok(Self { date, sequence })
    }

    /// First round of the given day.
    pub fn first_of_day(date: NaiveDate) -> Self {
        Self { date, sequence: 1 }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Returns the identifier with the sequence incremented by one, same day.
    ///
    /// # Errors
    ///
    /// - `PeriodError::SequenceOverflow` - Sequence is already 9999
    pub fn next(&self) -> Result<Self, PeriodError> {
        Self::for_index(self.date, u32::from(self.sequence) + 1)
    }

    /// Returns the period following this one as seen on `today`.
    ///
    /// Within the same day the sequence increments; on a later day the
    /// sequence restarts at 1.
    ///
    /// # Errors
    ///
    /// - `PeriodError::SequenceOverflow` - Same-day sequence is already 9999
    pub fn next_for_date(&self, today: NaiveDate) -> Result<Self, PeriodError> {
        if today > self.date {
            Ok(Self::first_of_day(today))
        } else {
            self.next()
        }
    }
}

impl std::fmt::Display for PeriodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:04}", self.date.format(DATE_FORMAT), self.sequence)
    }
}

impl FromStr for PeriodId {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PeriodError::Malformed {
            input: s.to_string(),
        };

        if s.len() != 12 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let date = NaiveDate::parse_from_str(&s[..8], DATE_FORMAT).map_err(|_| malformed())?;
        let sequence = s[8..].parse::<u16>().map_err(|_| malformed())?;

        Ok(Self { date, sequence })
    }
}

impl TryFrom<String> for PeriodId {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodId> for String {
    fn from(period: PeriodId) -> Self {
        period.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_pads_sequence() {
        let period = PeriodId::for_index(date(2024, 10, 16), 7).unwrap();
        assert_eq!(period.to_string(), "202410160007");
    }

    #[test]
    fn test_next_increments_trailing_sequence() {
        let period: PeriodId = "202410160007".parse().unwrap();
        assert_eq!(period.next().unwrap().to_string(), "202410160008");
    }

    #[test]
    fn test_next_for_date_restarts_on_new_day() {
        let period: PeriodId = "202410160042".parse().unwrap();
        assert_eq!(
            period.next_for_date(date(2024, 10, 16)).unwrap().to_string(),
            "202410160043"
        );
        assert_eq!(
            period.next_for_date(date(2024, 10, 17)).unwrap().to_string(),
            "202410170001"
        );
    }

    #[test]
    fn test_sequence_overflow() {
        let period: PeriodId = "202410169999".parse().unwrap();
        assert_eq!(
            period.next(),
            Err(PeriodError::SequenceOverflow {
                date: date(2024, 10, 16)
            })
        );
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!("2024101600".parse::<PeriodId>().is_err());
        assert!("20241016000a".parse::<PeriodId>().is_err());
        assert!("202413160001".parse::<PeriodId>().is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let period: PeriodId = "202410160003".parse().unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"202410160003\"");
        let back: PeriodId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }
}
