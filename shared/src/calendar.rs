//! Google Calendar event operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors returned by calendar operations.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Calendar rejected credentials")]
    Unauthorized,

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error: {0}")]
    Api(String),

    #[error("Timed out waiting for the calendar")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CalendarError {
    /// Whether this error means the access token is no longer usable.
    pub fn should_refresh_credentials(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Start or end of an event: a whole day, or an instant in a named zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            date_time: None,
            time_zone: None,
        }
    }

    pub fn at(instant: DateTime<Tz>) -> Self {
        Self {
            date: None,
            date_time: Some(instant.fixed_offset().to_rfc3339()),
            time_zone: Some(instant.timezone().name().to_string()),
        }
    }
}

/// Writable fields of a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub color_id: String,
}

/// Calendar operations the reconciler needs.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Create an event and return its assigned id.
    async fn create(&self, calendar_id: &str, event: &EventBody) -> Result<String, CalendarError>;

    /// Overwrite an existing event's content, returning its (unchanged) id.
    async fn update(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &EventBody,
    ) -> Result<String, CalendarError>;

    /// Delete an event.
    async fn delete(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError>;
}

#[derive(Debug, Deserialize)]
struct EventResource {
    id: String,
}

/// REST client for the Google Calendar v3 API.
pub struct GoogleCalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl std::fmt::Debug for GoogleCalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCalendarClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl GoogleCalendarClient {
    pub fn new(client: reqwest::Client, access_token: &str, base_url: &str) -> Self {
        Self {
            client,
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn create(&self, calendar_id: &str, event: &EventBody) -> Result<String, CalendarError> {
        let response = self
            .client
            .post(self.events_url(calendar_id))
            .header("Authorization", self.auth_header())
            .json(event)
            .send()
            .await?;

        let created: EventResource = handle_response(response).await?;
        debug!("Created event {} in calendar {}", created.id, calendar_id);
        Ok(created.id)
    }

    async fn update(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &EventBody,
    ) -> Result<String, CalendarError> {
        let response = self
            .client
            .patch(self.event_url(calendar_id, event_id))
            .header("Authorization", self.auth_header())
            .json(event)
            .send()
            .await?;

        let updated: EventResource = handle_response(response).await?;
        debug!("Updated event {} in calendar {}", updated.id, calendar_id);
        Ok(updated.id)
    }

    async fn delete(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        let response = self
            .client
            .delete(self.event_url(calendar_id, event_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        // 204 No Content on success
        if response.status().is_success() {
            debug!("Deleted event {} from calendar {}", event_id, calendar_id);
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CalendarError> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| CalendarError::Api(format!("JSON parse error: {}", e)))
    } else {
        Err(status_error(response).await)
    }
}

async fn status_error(response: reqwest::Response) -> CalendarError {
    let status = response.status();
    match status.as_u16() {
        401 => CalendarError::Unauthorized,
        404 | 410 => {
            let text = response.text().await.unwrap_or_default();
            CalendarError::NotFound(text)
        }
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            CalendarError::RateLimited(retry_after)
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            CalendarError::Api(format!("{}: {}", status, text))
        }
    }
}
