//! Submission client - one attempt to create an expense on the server.
//!
//! [`ExpenseSubmitter`] never queues anything itself; [`save_expense`] is the
//! immediate-save path that composes a submission with the pending queue, and
//! the sweeper replays queued drafts through the same trait.

use crate::{
    api::auth::USER_ID_HEADER,
    client::queue::{PendingEntry, PendingQueue},
    config::ClientConfig,
    core::expense::{CreatedExpense, DraftExpense},
    errors::{Error, Result},
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::{future::Future, time::Duration};
use tracing::{debug, instrument, warn};

/// Creates expenses on the expense service.
pub trait ExpenseSubmitter {
    /// Makes exactly one attempt to create `draft`.
    ///
    /// Transient failures (see [`Error::is_transient`]) are worth retrying;
    /// anything else will fail again with the same payload.
    fn submit(&self, draft: &DraftExpense) -> impl Future<Output = Result<CreatedExpense>> + Send;
}

/// Outcome of the immediate-save path.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The server accepted the expense
    Saved(CreatedExpense),
    /// The server was unreachable; the draft was queued for the next sweep
    Queued(PendingEntry),
}

/// Saves a draft now, or queues it when the failure is transient.
///
/// Invalid drafts are rejected before any network call and are never queued,
/// since retrying them could never succeed. Non-transient server rejections
/// are returned to the caller as errors.
#[instrument(skip_all, fields(category = %draft.category))]
pub async fn save_expense<S: ExpenseSubmitter>(
    submitter: &S,
    queue: &PendingQueue,
    draft: DraftExpense,
) -> Result<SaveOutcome> {
    draft.validate()?;

    match submitter.submit(&draft).await {
        Ok(created) => Ok(SaveOutcome::Saved(created)),
        Err(e) if e.is_transient() => {
            warn!(error = %e, "Submission failed, saving offline");
            Ok(SaveOutcome::Queued(queue.enqueue(draft).await?))
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Submits expenses to the REST API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl HttpSubmitter {
    /// Builds a submitter for `user_id` from the client settings.
    ///
    /// The configured timeout bounds every attempt; hitting it is a transient failure.
    pub fn new(config: &ClientConfig, user_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            user_id: user_id.into(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ExpenseSubmitter for HttpSubmitter {
    async fn submit(&self, draft: &DraftExpense) -> Result<CreatedExpense> {
        let url = format!("{}/expenses", self.base_url);
        debug!(%url, "Submitting expense");

        let response = self
            .client
            .post(&url)
            .header(USER_ID_HEADER, &self.user_id)
            .json(draft)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<CreatedExpense>().await?);
        }

        if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            return Err(Error::Unavailable {
                status: status.as_u16(),
            });
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map_or_else(|_| status.to_string(), |body| body.error);
        Err(Error::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::api::{self, AppState};
    use crate::client::{InMemoryBackend, Sweeper};
    use crate::config::AppConfig;
    use crate::core::alert::AlertKind;
    use crate::test_utils::*;
    use tokio::net::TcpListener;

    async fn spawn_server() -> Result<(String, sea_orm::DatabaseConnection)> {
        let db = setup_test_db().await?;
        let app = api::router(AppState::new(db.clone(), AppConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok((format!("http://{addr}/api"), db))
    }

    async fn unreachable_base_url() -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        Ok(format!("http://{addr}/api"))
    }

    fn submitter_for(base_url: String) -> HttpSubmitter {
        let config = ClientConfig {
            api_base_url: base_url,
            timeout_secs: 5,
            ..ClientConfig::default()
        };
        HttpSubmitter::new(&config, "user1").unwrap()
    }

    #[tokio::test]
    async fn test_invalid_draft_is_never_queued() -> Result<()> {
        let backend = InMemoryBackend::new();
        let queue = PendingQueue::new(setup_test_db().await?);

        let result = save_expense(&backend, &queue, draft(-3.0, "Food")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        let result = save_expense(&backend, &queue, draft(3.0, "")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidCategory));

        assert!(queue.is_empty().await?);
        assert!(backend.attempts().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_transient_failure_queues_draft() -> Result<()> {
        let backend = InMemoryBackend::new();
        backend.set_offline(true).await;
        let queue = PendingQueue::new(setup_test_db().await?);

        let outcome = save_expense(&backend, &queue, draft(12.0, "Food")).await?;
        let SaveOutcome::Queued(entry) = outcome else {
            panic!("expected the draft to be queued");
        };
        assert_eq!(entry.payload.amount, 12.0);
        assert_eq!(queue.drain().await?, vec![entry]);
        Ok(())
    }

    #[tokio::test]
    async fn test_success_returns_alert() -> Result<()> {
        let backend = InMemoryBackend::new();
        backend.set_budget("Food", 100.0).await;
        let queue = PendingQueue::new(setup_test_db().await?);

        let outcome = save_expense(&backend, &queue, draft(90.0, "Food")).await?;
        let SaveOutcome::Saved(created) = outcome else {
            panic!("expected the draft to be saved");
        };
        assert_eq!(created.expense.amount, 90.0);
        assert_eq!(created.alert.unwrap().kind, AlertKind::BudgetWarning);
        assert!(queue.is_empty().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_http_submit_creates_expense() -> Result<()> {
        let (base_url, db) = spawn_server().await?;
        create_test_budget(&db, "user1", "ALL", 100.0).await?;
        let submitter = submitter_for(base_url);

        let created = submitter.submit(&draft(120.0, "Food")).await?;
        assert_eq!(created.expense.amount, 120.0);
        assert_eq!(created.expense.category, "Food");
        assert_eq!(created.expense.user_id, "user1");
        let alert = created.alert.unwrap();
        assert_eq!(alert.kind, AlertKind::BudgetExceeded);
        assert_eq!(alert.category, "ALL");
        Ok(())
    }

    #[tokio::test]
    async fn test_http_rejection_is_not_transient() -> Result<()> {
        let (base_url, _db) = spawn_server().await?;
        let submitter = submitter_for(base_url);

        // Bypasses local validation to exercise the server's answer
        let err = submitter.submit(&draft(5.0, "  ")).await.unwrap_err();
        assert!(matches!(err, Error::Rejected { status: 400, .. }));
        assert!(!err.is_transient());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() -> Result<()> {
        let submitter = submitter_for(unreachable_base_url().await?);
        let err = submitter.submit(&draft(5.0, "Food")).await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err}");
        Ok(())
    }

    #[tokio::test]
    async fn test_offline_capture_then_sync_over_http() -> Result<()> {
        let queue = PendingQueue::new(setup_test_db().await?);

        let offline = Sweeper::new(submitter_for(unreachable_base_url().await?), queue.clone());
        assert!(matches!(
            offline.save(draft(10.0, "Food")).await?,
            SaveOutcome::Queued(_)
        ));
        assert!(matches!(
            offline.save(draft(20.0, "Transport")).await?,
            SaveOutcome::Queued(_)
        ));
        assert_eq!(offline.sync().await?, 0);
        assert_eq!(queue.len().await?, 2);

        let (base_url, db) = spawn_server().await?;
        let online = Sweeper::new(submitter_for(base_url), queue.clone());
        assert_eq!(online.sync().await?, 2);
        assert!(queue.is_empty().await?);

        let stored = crate::core::expense::list_expenses(&db, "user1", 200).await?;
        assert_eq!(stored.len(), 2);
        Ok(())
    }
}
