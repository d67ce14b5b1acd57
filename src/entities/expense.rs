//! Expense entity - A single spend event recorded by a user.
//!
//! Expenses are owned by the server. The `date` column is always stored at
//! midnight UTC of the day the money was spent, so period aggregation and the
//! stored values agree on one time zone.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Server-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the expense (supplied by the authentication layer)
    #[sea_orm(indexed)]
    pub user_id: String,
    /// Amount spent, never negative
    pub amount: f64,
    /// Free-text category label (e.g., "Food", "Transport")
    pub category: String,
    /// Day of the spend event, normalized to 00:00:00 UTC
    pub date: DateTimeUtc,
    /// Latitude of the spend location, if captured
    pub lat: Option<f64>,
    /// Longitude of the spend location, if captured
    pub lng: Option<f64>,
    /// Human-readable place name
    pub location_name: Option<String>,
    /// Free-form note
    pub note: Option<String>,
    /// Opaque receipt payload (URL or encoded image), not interpreted
    pub receipt_image: Option<String>,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

/// Expenses have no relations; budgets are matched by category text.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
