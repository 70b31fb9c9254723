use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::core::{AppError, Result};

/// Calendar used to decide which "day" an order or payment belongs to.
///
/// The daily shipping accumulator is keyed by the client's business day, not the
/// UTC date, so an order placed at 23:30 local time must not roll into tomorrow's row.
#[derive(Debug, Clone, Copy)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    /// Build a calendar from a whole-hour UTC offset (e.g. 9 for KST, 7 for WIB)
    pub fn from_offset_hours(hours: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
            AppError::Configuration(format!("Invalid business UTC offset: {} hours", hours))
        })?;
        Ok(Self { offset })
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Business date for a UTC instant
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Business date right now
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
