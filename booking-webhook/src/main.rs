//! Booking Webhook Lambda - Mirrors rental bookings into Google Calendar.
//!
//! Receives booking lifecycle webhooks from the booking app router and
//! creates, updates or deletes the box hire, collection and return events,
//! answering with the event ids the app should store for the next delivery.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::json_response;
use shared::{AwsSecretStore, Config, CredentialProvider, WebhookHandler};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    webhook: WebhookHandler<AwsSecretStore>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let store = AwsSecretStore::new(secrets_client);
        let credentials = CredentialProvider::from_config(store, &config, reqwest_client(&config)?);

        info!(
            "Booking webhook ready (timezone {}, default calendar {})",
            config.timezone, config.default_calendar_id
        );

        Ok(Self {
            webhook: WebhookHandler::new(config, credentials),
        })
    }
}

fn reqwest_client(config: &Config) -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?)
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let reply = state
        .webhook
        .process(event.headers(), event.body().as_ref())
        .await;

    json_response(reply.status, &reply.body)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
