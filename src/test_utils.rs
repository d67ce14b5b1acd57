//! Shared test utilities for `ExpenseBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test expenses and budgets with sensible defaults.

use crate::{
    core::{
        budget,
        expense::{self, DraftExpense},
    },
    entities,
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A draft with only amount and category set.
pub fn draft(amount: f64, category: &str) -> DraftExpense {
    DraftExpense::new(amount, category)
}

/// Stores an expense dated today.
///
/// # Defaults
/// * `date`: submission day
/// * no location, note or receipt
pub async fn create_test_expense(
    db: &DatabaseConnection,
    user_id: &str,
    amount: f64,
    category: &str,
) -> Result<entities::expense::Model> {
    expense::create_expense(db, user_id, &draft(amount, category), Utc::now()).await
}

/// Stores an expense on a specific date. Use this for period boundary tests.
pub async fn create_expense_on(
    db: &DatabaseConnection,
    user_id: &str,
    amount: f64,
    category: &str,
    date: DateTime<Utc>,
) -> Result<entities::expense::Model> {
    let draft = DraftExpense {
        date: Some(date),
        ..draft(amount, category)
    };
    expense::create_expense(db, user_id, &draft, Utc::now()).await
}

/// Creates or replaces a monthly budget.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    user_id: &str,
    category: &str,
    limit: f64,
) -> Result<entities::budget::Model> {
    budget::upsert_budget(db, user_id, Some(category), limit, None).await
}
