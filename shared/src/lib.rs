//! Shared library for the booking calendar Lambda.
//!
//! This crate turns rental booking webhooks into Google Calendar entries:
//! configuration, credentials, the calendar client and the reconciliation
//! logic that decides which events to create, update or delete.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod credentials;
pub mod dates;
pub mod error;
pub mod http;
pub mod models;
pub mod reconcile;
pub mod secrets;
pub mod webhook;

pub use calendar::{CalendarClient, CalendarError, EventBody, EventTime, GoogleCalendarClient};
pub use config::Config;
pub use credentials::{CredentialProvider, ServiceAccountKey};
pub use error::{Error, Result};
pub use models::{Booking, BookingStatus, DeletionOutcome, EventIds};
pub use reconcile::{Reconciler, Reconciliation};
pub use secrets::{AwsSecretStore, SecretStore};
pub use webhook::{WebhookHandler, WebhookReply};
