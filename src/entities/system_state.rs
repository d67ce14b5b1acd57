//! System state entity - Stores key-value pairs.
//! On the client this holds the serialized pending-expense queue as a single
//! keyed record that is read and written wholesale.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System state database model - stores key-value pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Record key (e.g., `"pending_expenses_queue"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Record value stored as string
    pub value: String,
    /// When this record was last written
    pub updated_at: DateTime,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
