//! Budget threshold alerts.
//!
//! Runs synchronously after an expense is stored and turns the fresh budget
//! ratios for the expense's category and the `"ALL"` budget into at most one
//! [`Alert`].
//!
//! Selection is deterministic and does not depend on store iteration order:
//! candidates are scanned `"ALL"` first, then the expense's category. Any
//! exceeded budget beats any warning, and the first exceeded in scan order is
//! reported. Among warnings the highest ratio wins, ties going to the earlier
//! budget in scan order. Budgets with a zero limit never alert.

use crate::{
    config::AlertThresholds,
    core::{
        budget::{self, ALL_CATEGORY, BudgetStatus},
        expense,
        period::{MONTHLY, Period},
    },
    entities::{Budget, budget as budget_entity},
    errors::Result,
};
use sea_orm::{DatabaseConnection, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Severity of a budget alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Spend reached the warning ratio but is still under the limit
    BudgetWarning,
    /// Spend reached or passed the limit
    BudgetExceeded,
}

/// Alert attached to an expense-creation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Warning or exceeded
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Budget category that triggered the alert (`"ALL"` for the overall budget)
    pub category: String,
    /// Percent of the limit used; always 100 for an exceeded alert
    pub percent: u32,
    /// Spend counted against the budget, including the new expense
    pub spent: f64,
    /// The budget's limit
    pub limit: f64,
}

/// Picks the alert for a new expense in `category` from freshly computed statuses.
///
/// Statuses for other categories are ignored, so the full output of
/// [`budget::compute_status`] can be passed in.
#[must_use]
pub fn evaluate(
    statuses: &[BudgetStatus],
    category: &str,
    thresholds: &AlertThresholds,
) -> Option<Alert> {
    let mut candidates: Vec<&BudgetStatus> = statuses
        .iter()
        .filter(|s| s.category == ALL_CATEGORY || s.category == category)
        .filter(|s| s.limit > 0.0)
        .collect();
    candidates.sort_by_key(|s| s.category != ALL_CATEGORY);

    if let Some(exceeded) = candidates
        .iter()
        .find(|s| s.ratio >= thresholds.exceeded_ratio)
    {
        return Some(Alert {
            kind: AlertKind::BudgetExceeded,
            category: exceeded.category.clone(),
            percent: 100,
            spent: exceeded.spent,
            limit: exceeded.limit,
        });
    }

    let mut warning: Option<&BudgetStatus> = None;
    for status in candidates {
        if status.ratio < thresholds.warning_ratio {
            continue;
        }
        if warning.is_none_or(|current| status.ratio > current.ratio) {
            warning = Some(status);
        }
    }

    warning.map(|s| Alert {
        kind: AlertKind::BudgetWarning,
        category: s.category.clone(),
        percent: ratio_to_percent(s.ratio),
        spent: s.spent,
        limit: s.limit,
    })
}

/// Evaluates alerts for a user's new expense against the stored budgets.
///
/// Reads the budgets for `category` and `"ALL"`; when none exist the
/// aggregation is skipped and no alert is produced. Otherwise totals are
/// recomputed from the expense rows, which already include the new expense.
#[instrument(skip(db, thresholds))]
pub async fn evaluate_for_category(
    db: &DatabaseConnection,
    user_id: &str,
    category: &str,
    period: Period,
    thresholds: &AlertThresholds,
) -> Result<Option<Alert>> {
    let budgets = Budget::find()
        .filter(budget_entity::Column::UserId.eq(user_id))
        .filter(budget_entity::Column::Period.eq(MONTHLY))
        .filter(budget_entity::Column::Category.is_in([ALL_CATEGORY, category]))
        .all(db)
        .await?;

    if budgets.is_empty() {
        debug!("No matching budgets, skipping alert evaluation");
        return Ok(None);
    }

    let totals = expense::category_totals(db, user_id, period).await?;
    let statuses = budget::compute_status(&budgets, &totals);
    Ok(evaluate(&statuses, category, thresholds))
}

fn ratio_to_percent(ratio: f64) -> u32 {
    // Only called below `exceeded_ratio`, which config loading keeps finite and above 0
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (ratio * 100.0).round() as u32;
    percent
}
