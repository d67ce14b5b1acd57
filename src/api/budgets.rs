//! `/api/budgets` handlers.

use crate::{
    api::{
        AppState,
        auth::AuthUser,
        expenses::{AmountInput, invalid_body},
    },
    core::{budget, period::Period},
    errors::{Error, Result},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::{Value, json};

/// Body of `POST /api/budgets`
#[derive(Debug, Deserialize)]
pub struct UpsertBudgetRequest {
    category: Option<String>,
    limit: Option<AmountInput>,
    period: Option<String>,
}

/// Body of `DELETE /api/budgets`
#[derive(Debug, Deserialize)]
pub struct DeleteBudgetRequest {
    category: Option<String>,
}

/// `GET /api/budgets`
pub async fn list(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<Value>> {
    let budgets = budget::list_budgets(&state.db, &user_id).await?;
    Ok(Json(json!({ "budgets": budgets })))
}

/// `POST /api/budgets`
pub async fn upsert(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: std::result::Result<Json<UpsertBudgetRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| invalid_body(&e))?;
    let limit = request
        .limit
        .ok_or(Error::InvalidAmount { amount: f64::NAN })?
        .parse()?;

    let saved = budget::upsert_budget(
        &state.db,
        &user_id,
        request.category.as_deref(),
        limit,
        request.period.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "budget": saved })))
}

/// `DELETE /api/budgets`
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: std::result::Result<Json<DeleteBudgetRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| invalid_body(&e))?;
    let category = request.category.ok_or(Error::InvalidCategory)?;

    budget::delete_budget(&state.db, &user_id, &category).await?;
    Ok(Json(json!({ "ok": true })))
}

/// `GET /api/budgets/status`
pub async fn status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>> {
    let status = budget::budget_status(&state.db, &user_id, Period::current()).await?;
    Ok(Json(json!({ "status": status })))
}
