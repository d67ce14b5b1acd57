//! `/api/forecast` handler.

use crate::{
    api::{AppState, auth::AuthUser},
    core::forecast::{self, Forecast},
    errors::Result,
};
use axum::{Json, extract::State};
use chrono::Utc;

/// `GET /api/forecast`
pub async fn current(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Forecast>> {
    Ok(Json(forecast::forecast(&state.db, &user_id, Utc::now()).await?))
}
