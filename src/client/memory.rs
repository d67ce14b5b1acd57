//! In-memory stand-in for the expense service.
//!
//! Used for previews and tests in place of the HTTP backend. Each instance
//! owns its own state (clones share it), and [`InMemoryBackend::reset`] wipes
//! everything between tests. Expenses are stored with the same date
//! normalization and alerts are computed with the same aggregator and alerter
//! code as the real server.

use crate::{
    client::submit::ExpenseSubmitter,
    config::AlertThresholds,
    core::{
        alert,
        budget::compute_status,
        expense::{CreatedExpense, DraftExpense, ExpenseView, SpendTotals},
        period::{MONTHLY, Period, normalize_to_utc_day},
    },
    entities::budget,
    errors::{Error, Result},
};
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::debug;

/// User every in-memory expense and budget belongs to
pub const DEMO_USER: &str = "demo-user";

#[derive(Debug, Default)]
struct BackendState {
    expenses: Vec<ExpenseView>,
    budgets: Vec<budget::Model>,
    next_id: i64,
    offline: bool,
    failing_categories: HashSet<String>,
    attempts: Vec<DraftExpense>,
}

/// Injectable fake expense service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
    thresholds: AlertThresholds,
}

impl InMemoryBackend {
    /// Empty backend with default alert thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty backend with custom alert thresholds.
    #[must_use]
    pub fn with_thresholds(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    /// Forgets all expenses, budgets, failure switches and recorded attempts.
    pub async fn reset(&self) {
        *self.state.lock().await = BackendState::default();
    }

    /// Makes every submission fail as if the network were down.
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// Makes submissions in `category` fail transiently until cleared.
    pub async fn fail_category(&self, category: &str) {
        self.state
            .lock()
            .await
            .failing_categories
            .insert(category.to_string());
    }

    /// Lets submissions in `category` succeed again.
    pub async fn heal_category(&self, category: &str) {
        self.state.lock().await.failing_categories.remove(category);
    }

    /// Creates or replaces a monthly budget.
    pub async fn set_budget(&self, category: &str, limit: f64) {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if let Some(existing) = state
            .budgets
            .iter_mut()
            .find(|b| b.category == category && b.period == MONTHLY)
        {
            existing.limit = limit;
            existing.updated_at = now;
            return;
        }
        let id = i64::try_from(state.budgets.len()).unwrap_or(i64::MAX) + 1;
        state.budgets.push(budget::Model {
            id,
            user_id: DEMO_USER.to_string(),
            category: category.to_string(),
            limit,
            period: MONTHLY.to_string(),
            created_at: now,
            updated_at: now,
        });
    }

    /// Stored expenses in creation order.
    pub async fn expenses(&self) -> Vec<ExpenseView> {
        self.state.lock().await.expenses.clone()
    }

    /// Every draft passed to `submit`, including failed attempts, in call order.
    pub async fn attempts(&self) -> Vec<DraftExpense> {
        self.state.lock().await.attempts.clone()
    }
}

impl ExpenseSubmitter for InMemoryBackend {
    async fn submit(&self, draft: &DraftExpense) -> Result<CreatedExpense> {
        let mut state = self.state.lock().await;
        state.attempts.push(draft.clone());

        if state.offline || state.failing_categories.contains(&draft.category) {
            debug!(category = %draft.category, "In-memory backend refusing submission");
            return Err(Error::Unavailable { status: 503 });
        }
        if draft.validate().is_err() {
            return Err(Error::Rejected {
                status: 400,
                message: "Invalid amount or category".to_string(),
            });
        }

        let now = Utc::now();
        state.next_id += 1;
        let expense = ExpenseView {
            id: state.next_id,
            user_id: DEMO_USER.to_string(),
            amount: draft.amount,
            category: draft.category.trim().to_string(),
            date: normalize_to_utc_day(draft.date.unwrap_or(now)),
            location: draft.location,
            location_name: draft.location_name.clone(),
            note: draft.note.clone(),
            receipt_image: draft.receipt_image.clone(),
            created_at: now,
        };
        state.expenses.push(expense.clone());

        let period = Period::containing(now);
        let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
        for e in state.expenses.iter().filter(|e| period.contains(e.date)) {
            *by_category.entry(e.category.clone()).or_insert(0.0) += e.amount;
        }
        let totals = SpendTotals::from_categories(by_category);
        let statuses = compute_status(&state.budgets, &totals);
        let alert = alert::evaluate(&statuses, &expense.category, &self.thresholds);

        Ok(CreatedExpense { expense, alert })
    }
}
