//! Month-end spend forecast.
//!
//! A naive linear extrapolation: average daily spend so far times the number
//! of days in the month. No seasonality, category weighting or outlier handling.

use crate::{
    core::{expense, period::Period},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Forecast for the period containing `now`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    /// Calendar month number, 1-12
    pub month: u32,
    /// Spend to date in the period
    pub spent: f64,
    /// `spent / days_passed`
    pub avg_per_day: f64,
    /// Projected month-end total
    pub forecast: f64,
    /// Days elapsed including today, at least 1
    pub days_passed: u32,
    /// Length of the month in days
    pub days_in_month: u32,
}

/// Projects `spent` over the whole month. `days_passed` is floored at 1.
#[must_use]
pub fn project(spent: f64, days_passed: u32, days_in_month: u32) -> (f64, f64) {
    let avg_per_day = spent / f64::from(days_passed.max(1));
    (avg_per_day, avg_per_day * f64::from(days_in_month))
}

/// Computes the forecast for a user at instant `now`.
#[instrument(skip(db))]
pub async fn forecast(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Forecast> {
    let period = Period::containing(now);
    let spent = expense::category_totals(db, user_id, period).await?.overall;

    let days_passed = period.days_passed(now);
    let days_in_month = period.days_in_month();
    let (avg_per_day, forecast) = project(spent, days_passed, days_in_month);

    Ok(Forecast {
        month: period.month(),
        spent,
        avg_per_day,
        forecast,
        days_passed,
        days_in_month,
    })
}
