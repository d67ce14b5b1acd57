//! `/api/expenses` handlers.

use crate::{
    api::{AppState, auth::AuthUser},
    core::{
        expense::{self, CreatedExpense, DraftExpense, ExpenseView, Location},
        period::{Period, midnight},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

/// Amount as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub(crate) fn parse(self) -> Result<f64> {
        match self {
            Self::Number(amount) => Ok(amount),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidAmount { amount: f64::NAN }),
        }
    }
}

/// Spend date as sent by clients: a full RFC 3339 instant or a plain day.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum DateInput {
    Instant(DateTime<Utc>),
    Day(NaiveDate),
}

impl From<DateInput> for DateTime<Utc> {
    fn from(input: DateInput) -> Self {
        match input {
            DateInput::Instant(instant) => instant,
            DateInput::Day(day) => midnight(day),
        }
    }
}

/// Body of `POST /api/expenses`. Everything is optional so missing fields
/// come back as validation errors rather than generic parse failures.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    amount: Option<AmountInput>,
    category: Option<String>,
    date: Option<DateInput>,
    location: Option<Location>,
    location_name: Option<String>,
    note: Option<String>,
    receipt_image: Option<String>,
}

impl CreateExpenseRequest {
    fn into_draft(self) -> Result<DraftExpense> {
        let amount = self
            .amount
            .ok_or(Error::InvalidAmount { amount: f64::NAN })?
            .parse()?;
        let category = self.category.ok_or(Error::InvalidCategory)?;

        Ok(DraftExpense {
            amount,
            category,
            date: self.date.map(Into::into),
            location: self.location,
            location_name: self.location_name,
            note: self.note,
            receipt_image: self.receipt_image,
        })
    }
}

pub(crate) fn invalid_body(rejection: &JsonRejection) -> Error {
    Error::InvalidRequest {
        message: rejection.body_text(),
    }
}

/// `POST /api/expenses`
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: std::result::Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedExpense>)> {
    let Json(request) = payload.map_err(|e| invalid_body(&e))?;
    let draft = request.into_draft()?;

    let created = expense::record_expense(&state.db, &user_id, &draft, &state.config.alerts).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/expenses`
pub async fn list(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<Value>> {
    let expenses: Vec<ExpenseView> =
        expense::list_expenses(&state.db, &user_id, state.config.expenses.list_limit)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
    Ok(Json(json!({ "expenses": expenses })))
}

/// `DELETE /api/expenses/{id}`
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(id) = id.map_err(|e| Error::InvalidRequest {
        message: e.body_text(),
    })?;
    expense::delete_expense(&state.db, &user_id, id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// `GET /api/expenses/totals`
pub async fn totals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>> {
    let period = Period::current();
    let totals = expense::category_totals(&state.db, &user_id, period).await?;
    Ok(Json(json!({
        "month": period.month(),
        "overall": totals.overall,
        "categories": totals.by_category,
    })))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use chrono::TimeZone;

    fn request(body: Value) -> CreateExpenseRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_amount_accepts_numbers_and_numeric_strings() {
        let draft = request(json!({"amount": 12, "category": "Food"})).into_draft().unwrap();
        assert_eq!(draft.amount, 12.0);

        let draft = request(json!({"amount": " 7.25 ", "category": "Food"}))
            .into_draft()
            .unwrap();
        assert_eq!(draft.amount, 7.25);
    }

    #[test]
    fn test_missing_or_garbage_amount_is_invalid() {
        let err = request(json!({"category": "Food"})).into_draft().unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));

        let err = request(json!({"amount": "abc", "category": "Food"}))
            .into_draft()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));
    }

    #[test]
    fn test_missing_category_is_invalid() {
        let err = request(json!({"amount": 3})).into_draft().unwrap_err();
        assert!(matches!(err, Error::InvalidCategory));
    }

    #[test]
    fn test_date_accepts_instant_or_day() {
        let draft = request(json!({
            "amount": 1, "category": "Food", "date": "2025-03-04T18:30:00Z"
        }))
        .into_draft()
        .unwrap();
        assert_eq!(
            draft.date,
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 18, 30, 0).unwrap())
        );

        let draft = request(json!({"amount": 1, "category": "Food", "date": "2025-03-04"}))
            .into_draft()
            .unwrap();
        assert_eq!(
            draft.date,
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_optional_fields_are_carried() {
        let draft = request(json!({
            "amount": 4.5,
            "category": "Coffee",
            "location": {"lat": 43.65, "lng": -79.38},
            "locationName": "Corner cafe",
            "note": "flat white",
            "receiptImage": "data:image/png;base64,AAAA"
        }))
        .into_draft()
        .unwrap();

        assert_eq!(draft.location, Some(Location { lat: 43.65, lng: -79.38 }));
        assert_eq!(draft.location_name.as_deref(), Some("Corner cafe"));
        assert_eq!(draft.note.as_deref(), Some("flat white"));
        assert!(draft.receipt_image.is_some());
    }
}
