//! Expense business logic - Handles recording, listing, deleting and aggregating expenses.
//!
//! Drafts are validated before anything touches the database, and every stored
//! `date` is normalized to midnight UTC. [`record_expense`] is the full
//! server-side create path: insert, then re-read the period totals and run the
//! threshold alerter. The two steps are not one transaction, so a concurrent
//! write from the same user may or may not be counted in the alert figures.

use crate::{
    config::AlertThresholds,
    core::{
        alert::{self, Alert},
        period::{Period, normalize_to_utc_day},
    },
    entities::{Expense, expense},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{FromQueryResult, QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Geographic coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// An expense as captured on the client, before the server has accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftExpense {
    /// Amount spent
    pub amount: f64,
    /// Free-text category
    pub category: String,
    /// When the money was spent; the server uses the submission day when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// Where the money was spent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Human-readable place name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Opaque receipt payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
}

impl DraftExpense {
    /// Creates a draft with only the required fields.
    pub fn new(amount: f64, category: impl Into<String>) -> Self {
        Self {
            amount,
            category: category.into(),
            date: None,
            location: None,
            location_name: None,
            note: None,
            receipt_image: None,
        }
    }

    /// Checks that the amount is a finite, non-negative number and the category is not blank.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::InvalidAmount {
                amount: self.amount,
            });
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidCategory);
        }
        Ok(())
    }
}

/// A persisted expense as exposed over the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    /// Server-assigned identifier
    pub id: i64,
    /// Owner
    pub user_id: String,
    /// Amount spent
    pub amount: f64,
    /// Category label
    pub category: String,
    /// Day of the spend event at midnight UTC
    pub date: DateTime<Utc>,
    /// Where the money was spent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Human-readable place name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Opaque receipt payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
    /// When the server stored the expense
    pub created_at: DateTime<Utc>,
}

impl From<expense::Model> for ExpenseView {
    fn from(model: expense::Model) -> Self {
        let location = match (model.lat, model.lng) {
            (Some(lat), Some(lng)) => Some(Location { lat, lng }),
            _ => None,
        };
        Self {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            category: model.category,
            date: model.date,
            location,
            location_name: model.location_name,
            note: model.note,
            receipt_image: model.receipt_image,
            created_at: model.created_at,
        }
    }
}

/// Result of a successful expense creation: the stored expense and at most one alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedExpense {
    /// The stored expense
    pub expense: ExpenseView,
    /// Budget alert triggered by this expense, if any
    pub alert: Option<Alert>,
}

/// Per-category and overall spend for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendTotals {
    /// Sum of amounts keyed by category
    pub by_category: BTreeMap<String, f64>,
    /// Sum of every category
    pub overall: f64,
}

impl SpendTotals {
    /// Builds totals from per-category sums; `overall` is their sum.
    #[must_use]
    pub fn from_categories(by_category: BTreeMap<String, f64>) -> Self {
        let overall = by_category.values().sum();
        Self {
            by_category,
            overall,
        }
    }

    /// Total for one category, 0 when nothing was spent there.
    #[must_use]
    pub fn for_category(&self, category: &str) -> f64 {
        self.by_category.get(category).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, FromQueryResult)]
struct CategorySum {
    category: String,
    total: f64,
}

/// Validates and stores a draft for `user_id`.
///
/// The stored date is the draft's date, or `now` when absent, truncated to
/// midnight UTC. The category is stored trimmed.
pub async fn create_expense(
    db: &DatabaseConnection,
    user_id: &str,
    draft: &DraftExpense,
    now: DateTime<Utc>,
) -> Result<expense::Model> {
    draft.validate()?;

    let expense_model = expense::ActiveModel {
        user_id: Set(user_id.to_string()),
        amount: Set(draft.amount),
        category: Set(draft.category.trim().to_string()),
        date: Set(normalize_to_utc_day(draft.date.unwrap_or(now))),
        lat: Set(draft.location.map(|l| l.lat)),
        lng: Set(draft.location.map(|l| l.lng)),
        location_name: Set(draft.location_name.clone()),
        note: Set(draft.note.clone()),
        receipt_image: Set(draft.receipt_image.clone()),
        created_at: Set(now),
        ..Default::default()
    };

    let result = expense_model.insert(db).await?;
    debug!(id = result.id, category = %result.category, amount = result.amount, "Expense stored");
    Ok(result)
}

/// Stores an expense and evaluates budget alerts for the current period.
///
/// This is the complete create operation behind `POST /expenses`.
#[instrument(skip(db, draft, thresholds), fields(category = %draft.category))]
pub async fn record_expense(
    db: &DatabaseConnection,
    user_id: &str,
    draft: &DraftExpense,
    thresholds: &AlertThresholds,
) -> Result<CreatedExpense> {
    let now = Utc::now();
    let stored = create_expense(db, user_id, draft, now).await?;

    let alert = alert::evaluate_for_category(
        db,
        user_id,
        &stored.category,
        Period::containing(now),
        thresholds,
    )
    .await?;
    if let Some(alert) = &alert {
        info!(kind = ?alert.kind, budget = %alert.category, percent = alert.percent, "Budget alert raised");
    }

    Ok(CreatedExpense {
        expense: stored.into(),
        alert,
    })
}

/// Lists a user's expenses, most recent first, at most `limit` rows.
///
/// Expenses on the same day are ordered by insertion, newest first.
pub async fn list_expenses(
    db: &DatabaseConnection,
    user_id: &str,
    limit: u64,
) -> Result<Vec<expense::Model>> {
    Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .order_by_desc(expense::Column::Date)
        .order_by_desc(expense::Column::CreatedAt)
        .order_by_desc(expense::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes one of the user's expenses.
///
/// Expenses belonging to other users are reported as not found.
pub async fn delete_expense(db: &DatabaseConnection, user_id: &str, expense_id: i64) -> Result<()> {
    let result = Expense::delete_many()
        .filter(expense::Column::Id.eq(expense_id))
        .filter(expense::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ExpenseNotFound { id: expense_id });
    }
    info!(id = expense_id, "Expense deleted");
    Ok(())
}

/// Sums a user's expenses in `period`, grouped by category.
pub async fn category_totals(
    db: &DatabaseConnection,
    user_id: &str,
    period: Period,
) -> Result<SpendTotals> {
    let sums = Expense::find()
        .select_only()
        .column(expense::Column::Category)
        .column_as(expense::Column::Amount.sum(), "total")
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::Date.gte(period.start))
        .filter(expense::Column::Date.lt(period.end))
        .group_by(expense::Column::Category)
        .into_model::<CategorySum>()
        .all(db)
        .await?;

    Ok(SpendTotals::from_categories(
        sums.into_iter().map(|s| (s.category, s.total)).collect(),
    ))
}
