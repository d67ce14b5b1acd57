//! Budget business logic and the budget status aggregator.
//!
//! Budgets are upserted per `(user, category, period)`. [`budget_status`]
//! recomputes spend-vs-limit for every configured budget straight from the
//! expense rows on each call; nothing is cached, so a status read right after
//! an expense write always reflects it.

use crate::{
    core::{
        expense::{self, SpendTotals},
        period::{MONTHLY, Period},
    },
    entities::{Budget, budget},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Category name of the aggregate budget across all categories
pub const ALL_CATEGORY: &str = "ALL";

/// Spend-vs-limit for one budget. Derived on request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// Budget category, `"ALL"` for the aggregate budget
    pub category: String,
    /// Budget ceiling
    pub limit: f64,
    /// Spend counted against the budget this period
    pub spent: f64,
    /// `spent / limit`, or 0 when the limit is 0
    pub ratio: f64,
}

impl BudgetStatus {
    /// Builds a status and derives its ratio.
    #[must_use]
    pub fn new(category: String, limit: f64, spent: f64) -> Self {
        let ratio = if limit > 0.0 { spent / limit } else { 0.0 };
        Self {
            category,
            limit,
            spent,
            ratio,
        }
    }
}

/// Computes the status of each budget from period totals.
///
/// The `"ALL"` budget is charged with the overall total, every other budget
/// with its own category total (0 when nothing was spent). Output puts
/// `"ALL"` first, then categories in ascending order.
#[must_use]
pub fn compute_status(budgets: &[budget::Model], totals: &SpendTotals) -> Vec<BudgetStatus> {
    let mut statuses: Vec<BudgetStatus> = budgets
        .iter()
        .map(|b| {
            let spent = if b.category == ALL_CATEGORY {
                totals.overall
            } else {
                totals.for_category(&b.category)
            };
            BudgetStatus::new(b.category.clone(), b.limit, spent)
        })
        .collect();

    statuses.sort_by(|a, b| {
        (a.category != ALL_CATEGORY, &a.category).cmp(&(b.category != ALL_CATEGORY, &b.category))
    });
    statuses
}

/// Returns the status of every monthly budget the user has configured.
///
/// Categories with spend but no budget are not included; see
/// [`expense::category_totals`] for raw per-category figures.
#[instrument(skip(db))]
pub async fn budget_status(
    db: &DatabaseConnection,
    user_id: &str,
    period: Period,
) -> Result<Vec<BudgetStatus>> {
    let budgets = list_budgets(db, user_id).await?;
    let totals = expense::category_totals(db, user_id, period).await?;
    Ok(compute_status(&budgets, &totals))
}

/// Retrieves all monthly budgets of a user, ordered by category.
pub async fn list_budgets(db: &DatabaseConnection, user_id: &str) -> Result<Vec<budget::Model>> {
    Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Period.eq(MONTHLY))
        .order_by_asc(budget::Column::Category)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a budget or replaces the limit of the existing one.
///
/// `category` defaults to `"ALL"` and `period` to `"monthly"`, the only
/// supported period. The lookup and write run in one database transaction and
/// the unique `(user_id, category, period)` index backs the one-row-per-key rule.
#[instrument(skip(db))]
pub async fn upsert_budget(
    db: &DatabaseConnection,
    user_id: &str,
    category: Option<&str>,
    limit: f64,
    period: Option<&str>,
) -> Result<budget::Model> {
    if !limit.is_finite() || limit < 0.0 {
        return Err(Error::InvalidAmount { amount: limit });
    }

    let period = period.map_or(MONTHLY, str::trim);
    if period != MONTHLY {
        return Err(Error::InvalidPeriod {
            period: period.to_string(),
        });
    }

    let category = category.map_or(ALL_CATEGORY, str::trim);
    if category.is_empty() {
        return Err(Error::InvalidCategory);
    }

    let now = Utc::now();
    let txn = db.begin().await?;

    let existing = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Category.eq(category))
        .filter(budget::Column::Period.eq(period))
        .one(&txn)
        .await?;

    let saved = if let Some(found) = existing {
        let mut active_model: budget::ActiveModel = found.into();
        active_model.limit = Set(limit);
        active_model.updated_at = Set(now);
        active_model.update(&txn).await?
    } else {
        budget::ActiveModel {
            user_id: Set(user_id.to_string()),
            category: Set(category.to_string()),
            limit: Set(limit),
            period: Set(period.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?
    };

    txn.commit().await?;
    info!(category = %saved.category, limit = saved.limit, "Budget saved");
    Ok(saved)
}

/// Deletes a category budget. The `"ALL"` budget is protected.
pub async fn delete_budget(db: &DatabaseConnection, user_id: &str, category: &str) -> Result<()> {
    let category = category.trim();
    if category.is_empty() {
        return Err(Error::InvalidCategory);
    }
    if category == ALL_CATEGORY {
        return Err(Error::ProtectedBudget);
    }

    let result = Budget::delete_many()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Category.eq(category))
        .filter(budget::Column::Period.eq(MONTHLY))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::BudgetNotFound {
            category: category.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_status_ratio_correctness() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_budget(&db, "user1", "Food", 200.0).await?;
        create_test_budget(&db, "user1", "ALL", 1000.0).await?;
        create_test_expense(&db, "user1", 100.0, "Food").await?;
        create_test_expense(&db, "user1", 50.0, "Food").await?;
        create_test_expense(&db, "user1", 50.0, "Transport").await?;

        let status = budget_status(&db, "user1", Period::current()).await?;
        assert_eq!(status.len(), 2);

        assert_eq!(status[0].category, "ALL");
        assert_eq!(status[0].spent, 200.0);
        assert_eq!(status[0].ratio, 0.2);

        assert_eq!(status[1].category, "Food");
        assert_eq!(status[1].spent, 150.0);
        assert_eq!(status[1].ratio, 0.75);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_ignores_out_of_period_expenses() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_budget(&db, "user1", "Food", 100.0).await?;

        let period = Period::current();
        create_expense_on(&db, "user1", 30.0, "Food", period.start).await?;
        create_expense_on(&db, "user1", 70.0, "Food", period.start - Duration::days(1)).await?;
        create_expense_on(&db, "user1", 70.0, "Food", period.end).await?;

        let status = budget_status(&db, "user1", period).await?;
        assert_eq!(status[0].spent, 30.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_budget_without_spend_and_zero_limit() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_budget(&db, "user1", "Travel", 300.0).await?;
        create_test_budget(&db, "user1", "Gifts", 0.0).await?;
        create_test_expense(&db, "user1", 25.0, "Gifts").await?;

        let status = budget_status(&db, "user1", Period::current()).await?;
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].category, "Gifts");
        assert_eq!(status[0].spent, 25.0);
        assert_eq!(status[0].ratio, 0.0);
        assert_eq!(status[1].category, "Travel");
        assert_eq!(status[1].spent, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_replaces_limit() -> Result<()> {
        let db = setup_test_db().await?;
        let first = upsert_budget(&db, "user1", Some("Food"), 200.0, None).await?;
        let second = upsert_budget(&db, "user1", Some("Food"), 350.0, Some("monthly")).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.limit, 350.0);

        let budgets = list_budgets(&db, "user1").await?;
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].limit, 350.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_defaults_to_all_category() -> Result<()> {
        let db = setup_test_db().await?;
        let budget = upsert_budget(&db, "user1", None, 1500.0, None).await?;
        assert_eq!(budget.category, ALL_CATEGORY);
        assert_eq!(budget.period, MONTHLY);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = upsert_budget(&db, "user1", Some("Food"), -5.0, None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: -5.0 }));

        let result = upsert_budget(&db, "user1", Some("Food"), f64::NAN, None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        let result = upsert_budget(&db, "user1", Some("Food"), 10.0, Some("weekly")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidPeriod { period: _ }));

        let result = upsert_budget(&db, "user1", Some("  "), 10.0, None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidCategory));

        assert!(list_budgets(&db, "user1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_budgets_are_per_user() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_budget(&db, "user1", Some("Food"), 200.0, None).await?;
        upsert_budget(&db, "user2", Some("Food"), 400.0, None).await?;

        let budgets = list_budgets(&db, "user2").await?;
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].limit, 400.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_budget() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_budget(&db, "user1", "ALL", 1000.0).await?;
        create_test_budget(&db, "user1", "Food", 200.0).await?;

        delete_budget(&db, "user1", "Food").await?;
        assert_eq!(list_budgets(&db, "user1").await?.len(), 1);

        let again = delete_budget(&db, "user1", "Food").await;
        assert!(matches!(again.unwrap_err(), Error::BudgetNotFound { category: _ }));

        let protected = delete_budget(&db, "user1", "ALL").await;
        assert!(matches!(protected.unwrap_err(), Error::ProtectedBudget));
        Ok(())
    }
}
