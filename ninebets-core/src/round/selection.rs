//! Bet selections: a single number, a color, or a size.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RoundError;

/// Ball color classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Violet,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Violet => "violet",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = RoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "violet" => Ok(Color::Violet),
            _ => Err(RoundError::InvalidSelection {
                input: s.to_string(),
            }),
        }
    }
}

/// Big (5-9) or small (0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Big,
    Small,
}

impl Size {
    pub fn as_str(self) -> &'static str {
        match self {
            Size::Big => "big",
            Size::Small => "small",
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = RoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "big" => Ok(Size::Big),
            "small" => Ok(Size::Small),
            _ => Err(RoundError::InvalidSelection {
                input: s.to_string(),
            }),
        }
    }
}

/// A ball number in `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// All ten ball numbers in ascending order.
    pub const ALL: [Digit; 10] = [
        Digit(0),
        Digit(1),
        Digit(2),
        Digit(3),
        Digit(4),
        Digit(5),
        Digit(6),
        Digit(7),
        Digit(8),
        Digit(9),
    ];

    /// Returns the digit for `value`, or `None` above 9.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 9 { Some(Self(value)) } else { None }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = RoundError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Digit::new(value).ok_or_else(|| RoundError::InvalidSelection {
            input: value.to_string(),
        })
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl std::fmt::Display for Digit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Digit {
    type Err = RoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Digit::new)
            .ok_or_else(|| RoundError::InvalidSelection {
                input: s.to_string(),
            })
    }
}

/// What a player bets on for one round.
///
/// Serialized as its text form (`"3"`, `"red"`, `"big"`), which is also how
/// history records store it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selection {
    Number(Digit),
    Color(Color),
    Size(Size),
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Number(digit) => digit.fmt(f),
            Selection::Color(color) => color.fmt(f),
            Selection::Size(size) => size.fmt(f),
        }
    }
}

impl FromStr for Selection {
    type Err = RoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(digit) = s.parse::<Digit>() {
            return Ok(Selection::Number(digit));
        }
        if let Ok(color) = s.parse::<Color>() {
            return Ok(Selection::Color(color));
        }
        if let Ok(size) = s.parse::<Size>() {
            return Ok(Selection::Size(size));
        }
        Err(RoundError::InvalidSelection {
            input: s.to_string(),
        })
    }
}

impl TryFrom<String> for Selection {
    type Error = RoundError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        selection.to_string()
    }
}
