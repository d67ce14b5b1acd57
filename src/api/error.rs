//! HTTP mapping for [`Error`].

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidAmount { .. }
            | Self::InvalidCategory
            | Self::InvalidPeriod { .. }
            | Self::InvalidRequest { .. }
            | Self::ProtectedBudget => StatusCode::BAD_REQUEST,
            Self::ExpenseNotFound { .. } | Self::BudgetNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Store and I/O failures are logged, not echoed to the caller
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::InvalidAmount { amount: -1.0 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::InvalidCategory.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::ProtectedBudget.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::ExpenseNotFound { id: 7 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::BudgetNotFound {
                category: "Food".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response = Error::Database(sea_orm::DbErr::Custom("secret table".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();
        assert_eq!(body["error"], "Server error");
    }
}
