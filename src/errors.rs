//! Unified error type for the expense tracker.
//!
//! Every layer (core services, the HTTP API, and the offline client) returns
//! [`Result`], so errors propagate with `?` from the database or the network
//! straight up to the caller that decides what to do with them.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Amount is missing, non-numeric, negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount (NaN when it could not be parsed)
        amount: f64,
    },

    /// Category is missing or blank
    #[error("Invalid category: a non-empty category is required")]
    InvalidCategory,

    /// Budget period other than `"monthly"`
    #[error("Unsupported budget period: {period}")]
    InvalidPeriod {
        /// The rejected period label
        period: String,
    },

    /// Malformed request that does not fit a more specific variant
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Human-readable reason
        message: String,
    },

    /// No expense with this id belongs to the caller
    #[error("Expense not found: {id}")]
    ExpenseNotFound {
        /// Requested expense id
        id: i64,
    },

    /// No budget configured for this category
    #[error("Budget not found: {category}")]
    BudgetNotFound {
        /// Requested budget category
        category: String,
    },

    /// The aggregate `"ALL"` budget cannot be deleted
    #[error("The ALL budget cannot be deleted")]
    ProtectedBudget,

    /// No user identity was supplied with the request
    #[error("Missing user identity")]
    Unauthenticated,

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Network-level failure talking to the expense service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The expense service refused the request with a non-retryable status
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the service
        status: u16,
        /// Error message from the response body, if any
        message: String,
    },

    /// The expense service answered with a retryable status (5xx, 408, 429)
    #[error("Service unavailable ({status})")]
    Unavailable {
        /// HTTP status code returned by the service
        status: u16,
    },

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure (binding the listener, reading files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a failed submission is worth retrying later.
    ///
    /// Transient failures are recovered by queueing the draft; everything else
    /// is surfaced to the caller immediately.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            Self::Unavailable { .. } => true,
            _ => false,
        }
    }

    /// Whether this error is a permanent input problem.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::InvalidCategory
                | Self::InvalidPeriod { .. }
                | Self::InvalidRequest { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
