//! Booking webhook request processing.

use lambda_http::http::HeaderMap;
use serde::Serialize;
use tracing::{error, info};

use crate::auth::verify_webhook_source;
use crate::calendar::CalendarError;
use crate::credentials::CredentialProvider;
use crate::http::parse_json_body;
use crate::models::{
    Booking, CancelledResponse, ErrorResponse, EventIds, MessageResponse, SyncedResponse,
};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::secrets::SecretStore;
use crate::{Config, Error, Result};

pub const IGNORED_MESSAGE: &str = "Invalid status, routing ended.";
pub const CANCELLED_MESSAGE: &str = "Booking cancelled, calendar events removed.";
const ERROR_MESSAGE: &str = "Error processing booking";

/// Status code and JSON body to send back to the webhook router.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookReply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl WebhookReply {
    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        let body = serde_json::to_value(body).unwrap_or_else(|e| {
            error!("Failed to serialize reply: {}", e);
            serde_json::json!({ "message": ERROR_MESSAGE })
        });
        Self { status, body }
    }

    fn from_error(err: &Error) -> Self {
        if matches!(err, Error::Unauthorized) {
            return Self::json(
                401,
                &MessageResponse {
                    message: "Unauthorized".to_string(),
                },
            );
        }

        let partial = match err {
            Error::CalendarOperationFailed { partial, .. } => Some(partial.clone()),
            _ => None,
        };

        Self::json(
            err.status_code(),
            &ErrorResponse {
                message: ERROR_MESSAGE.to_string(),
                error: err.to_string(),
                partial,
            },
        )
    }

    fn from_reconciliation(outcome: Reconciliation) -> Self {
        match outcome {
            Reconciliation::Ignored { .. } => Self::json(
                200,
                &MessageResponse {
                    message: IGNORED_MESSAGE.to_string(),
                },
            ),
            Reconciliation::Cancelled { row_id, deletions } => Self::json(
                200,
                &CancelledResponse {
                    row_id,
                    message: CANCELLED_MESSAGE.to_string(),
                    event_ids: EventIds::default(),
                    deletions,
                },
            ),
            Reconciliation::Synced { row_id, event_ids } => {
                Self::json(200, &SyncedResponse { row_id, event_ids })
            }
        }
    }
}

/// Long-lived request processing state, created once per Lambda container.
pub struct WebhookHandler<S> {
    config: Config,
    credentials: CredentialProvider<S>,
    reconciler: Reconciler,
}

impl<S: SecretStore> WebhookHandler<S> {
    pub fn new(config: Config, credentials: CredentialProvider<S>) -> Self {
        let reconciler = Reconciler::from_config(&config);
        Self {
            config,
            credentials,
            reconciler,
        }
    }

    /// Handle one webhook delivery. Never fails; errors become error replies.
    pub async fn process(&self, headers: &HeaderMap, body: &[u8]) -> WebhookReply {
        match self.try_process(headers, body).await {
            Ok(outcome) => WebhookReply::from_reconciliation(outcome),
            Err(e) => {
                if e.should_refresh_credentials() {
                    self.credentials.invalidate().await;
                }
                match &e {
                    Error::Unauthorized => {}
                    Error::Validation(_) => info!("Rejected booking payload: {}", e),
                    _ => error!("Error processing booking: {}", e),
                }
                WebhookReply::from_error(&e)
            }
        }
    }

    async fn try_process(&self, headers: &HeaderMap, body: &[u8]) -> Result<Reconciliation> {
        verify_webhook_source(
            headers,
            &self.config.webhook_source_header,
            &self.config.webhook_source_value,
        )?;

        let booking: Booking = parse_json_body(body)?;
        info!(
            "Booking webhook for row {} with status '{}'",
            booking.row_id, booking.status
        );

        // Unknown statuses need no credentials
        if booking.status().is_err() {
            return Ok(Reconciliation::Ignored {
                status: booking.status.clone(),
            });
        }

        let client = self.credentials.get_client().await?;

        let mut ids = booking.event_ids();
        let outcome = tokio::time::timeout(
            self.config.request_timeout,
            self.reconciler.reconcile_into(&booking, &client, &mut ids),
        )
        .await;

        outcome.map_err(|_| Error::CalendarOperationFailed {
            partial: ids,
            source: CalendarError::Timeout,
        })?
    }
}
