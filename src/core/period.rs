//! Budget period arithmetic.
//!
//! A period is one calendar month expressed as the half-open interval
//! `[start, end)` in UTC. Stored expense dates are normalized to midnight UTC
//! with [`normalize_to_utc_day`], so both sides of every comparison use the
//! same zone and boundary-day expenses never fall outside their month.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

/// Label of the only supported budget period
pub const MONTHLY: &str = "monthly";

/// One calendar month as `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// First instant of the month
    pub start: DateTime<Utc>,
    /// First instant of the following month
    pub end: DateTime<Utc>,
}

impl Period {
    /// The month containing `instant`.
    #[must_use]
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let first = first_of_month(instant.year(), instant.month());
        let next = if instant.month() == 12 {
            first_of_month(instant.year() + 1, 1)
        } else {
            first_of_month(instant.year(), instant.month() + 1)
        };
        Self {
            start: midnight(first),
            end: midnight(next),
        }
    }

    /// The month containing the current instant.
    #[must_use]
    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    /// Calendar month number, 1-12.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        // At most 31, the cast cannot truncate
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let days = (self.end - self.start).num_days() as u32;
        days
    }

    /// Days elapsed since the start of the period, counting today, floored at 1
    /// and capped at the length of the month.
    #[must_use]
    pub fn days_passed(&self, now: DateTime<Utc>) -> u32 {
        if now < self.start {
            return 1;
        }
        let elapsed = (now - self.start).num_days() + 1;
        u32::try_from(elapsed)
            .unwrap_or(u32::MAX)
            .clamp(1, self.days_in_month())
    }

    /// Whether `instant` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Truncates an instant to 00:00:00 of its UTC day.
#[must_use]
pub fn normalize_to_utc_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    midnight(instant.date_naive())
}

/// Midnight UTC of a calendar day.
#[must_use]
pub fn midnight(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Day 1 exists in every month of every representable year
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}
