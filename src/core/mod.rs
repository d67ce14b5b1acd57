//! Core business logic - framework-agnostic expense, budget, alert and forecast operations.
//!
//! Nothing here knows about HTTP; the API layer and the tests call these
//! functions directly with a `SeaORM` connection.

/// Threshold alerter for newly created expenses
pub mod alert;
/// Budget upserts and the spend-vs-limit aggregator
pub mod budget;
/// Expense recording, listing and per-category totals
pub mod expense;
/// Month-end spend forecast
pub mod forecast;
/// UTC calendar-month periods
pub mod period;
