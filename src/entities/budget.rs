//! Budget entity - A spending ceiling for one category over one period.
//!
//! The `(user_id, category, period)` triple is unique; the composite index is
//! created alongside the table. The special category `"ALL"` caps the sum of
//! every category.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the budget row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the budget
    pub user_id: String,
    /// Category this budget caps, or `"ALL"` for the overall budget
    pub category: String,
    /// Spending ceiling for the period, never negative
    pub limit: f64,
    /// Budget period label; only `"monthly"` is used
    pub period: String,
    /// When the budget was first created
    pub created_at: DateTimeUtc,
    /// When the limit was last replaced
    pub updated_at: DateTimeUtc,
}

/// `Budget` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
