//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation is idempotent, which lets the
//! server and the offline client call [`create_tables`] on every start against a file
//! database that may already exist.

use crate::entities::{Budget, Expense, SystemState, budget};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

/// Connects to the database at `url` and makes sure all tables exist.
#[instrument]
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    debug!("Opening database connection");
    let db = Database::connect(url).await?;
    create_tables(&db).await?;
    info!("Database ready");
    Ok(db)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// It creates tables for expenses, budgets and system state, the index on
/// `expenses.user_id`, and the composite unique index that backs budget upserts.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(Expense),
        schema.create_table_from_entity(Budget),
        schema.create_table_from_entity(SystemState),
    ];
    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    for mut index in schema.create_index_from_entity(Expense) {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }

    let budget_key = Index::create()
        .name("idx_budgets_user_category_period")
        .table(Budget)
        .col(budget::Column::UserId)
        .col(budget::Column::Category)
        .col(budget::Column::Period)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&budget_key)).await?;

    Ok(())
}

/// Creates only the `system_state` table, which is all the on-device queue store needs.
pub async fn create_queue_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let mut table = Schema::new(builder).create_table_from_entity(SystemState);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        budget::Model as BudgetModel, expense::Model as ExpenseModel,
        system_state::Model as SystemStateModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ExpenseModel> = Expense::find().limit(1).all(&db).await?;
        let _: Vec<BudgetModel> = Budget::find().limit(1).all(&db).await?;
        let _: Vec<SystemStateModel> = SystemState::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_queue_tables_only_hold_system_state() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_queue_tables(&db).await?;
        create_queue_tables(&db).await?;

        let _: Vec<SystemStateModel> = SystemState::find().limit(1).all(&db).await?;
        assert!(Expense::find().limit(1).all(&db).await.is_err());
        assert!(Budget::find().limit(1).all(&db).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_connect_creates_schema() -> Result<()> {
        let db = connect("sqlite::memory:").await?;
        let _: Vec<ExpenseModel> = Expense::find().limit(1).all(&db).await?;
        Ok(())
    }
}
