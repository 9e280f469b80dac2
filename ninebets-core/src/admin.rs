//! Admin draw submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::round::{Color, Digit, RoundError, Size};
use crate::store::AdminDraw;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminDrawError {
    #[error("Please select all options: {field} is missing")]
    MissingField { field: &'static str },

    #[error(transparent)]
    InvalidValue(#[from] RoundError),
}

/// Raw selections as submitted from the admin panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSelections {
    pub number: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// `POST /add-draw` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDrawRequest {
    pub room_id: u32,
    #[serde(default)]
    pub selections: AdminSelections,
}

impl AdminDrawRequest {
    /// Checks that number, color and size are all present and well formed.
    ///
    /// # Errors
    ///
    /// - `AdminDrawError::MissingField` - A selection is absent or blank
    /// - `AdminDrawError::InvalidValue` - A selection does not parse
    pub fn validate(&self, now: DateTime<Utc>) -> Result<AdminDraw, AdminDrawError> {
        let number = required(&self.selections.number, "number")?.parse::<Digit>()?;
        let color = required(&self.selections.color, "color")?.parse::<Color>()?;
        let size = required(&self.selections.size, "size")?.parse::<Size>()?;

        Ok(AdminDraw {
            id: Uuid::new_v4(),
            room_id: self.room_id,
            number,
            color,
            size,
            created_at: now,
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, AdminDrawError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(AdminDrawError::MissingField { field })
}
