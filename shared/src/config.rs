//! Configuration management for the booking webhook.

use chrono_tz::Tz;
use std::env;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret id/ARN holding the Google service-account key
    pub service_account_secret: Option<String>,
    /// Header the webhook router identifies itself with
    pub webhook_source_header: String,
    /// Expected value of `webhook_source_header`
    pub webhook_source_value: String,
    /// Zone appointment wall-clock times are interpreted in
    pub timezone: Tz,
    /// Calendar used when a booking names none
    pub default_calendar_id: String,
    /// Google Calendar REST base URL
    pub calendar_api_base: String,
    /// Upper bound on one reconciliation
    pub request_timeout: Duration,
    /// Length of collection and return appointments
    pub appointment_duration: chrono::Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timezone = match var("BOOKING_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|e| Error::Config(format!("BOOKING_TIMEZONE: {}", e)))?,
            None => chrono_tz::Europe::London,
        };

        let request_timeout = match var("REQUEST_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .map_err(|e| Error::Config(format!("REQUEST_TIMEOUT_SECS: {}", e)))?,
            ),
            None => Duration::from_secs(25),
        };

        let appointment_minutes: i64 = match var("APPOINTMENT_DURATION_MINUTES") {
            Some(minutes) => minutes
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("APPOINTMENT_DURATION_MINUTES: {}", e)))?,
            None => 30,
        };
        if appointment_minutes <= 0 {
            return Err(Error::Config(
                "APPOINTMENT_DURATION_MINUTES must be positive".to_string(),
            ));
        }
        let appointment_duration = chrono::Duration::try_minutes(appointment_minutes)
            .ok_or_else(|| Error::Config("APPOINTMENT_DURATION_MINUTES is too large".to_string()))?;

        Ok(Self {
            service_account_secret: var("GOOGLE_SERVICE_ACCOUNT_SECRET"),
            webhook_source_header: var("WEBHOOK_SOURCE_HEADER")
                .unwrap_or_else(|| "x-webhook-source".to_string()),
            webhook_source_value: var("WEBHOOK_SOURCE_VALUE")
                .unwrap_or_else(|| "roofbox-webhook-router".to_string()),
            timezone,
            default_calendar_id: var("DEFAULT_CALENDAR_ID")
                .unwrap_or_else(|| "primary".to_string()),
            calendar_api_base: var("CALENDAR_API_BASE")
                .unwrap_or_else(|| DEFAULT_CALENDAR_API_BASE.to_string()),
            request_timeout,
            appointment_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.service_account_secret, None);
        assert_eq!(config.webhook_source_header, "x-webhook-source");
        assert_eq!(config.webhook_source_value, "roofbox-webhook-router");
        assert_eq!(config.timezone, chrono_tz::Europe::London);
        assert_eq!(config.default_calendar_id, "primary");
        assert_eq!(config.request_timeout, Duration::from_secs(25));
        assert_eq!(config.appointment_duration, chrono::Duration::minutes(30));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GOOGLE_SERVICE_ACCOUNT_SECRET", "roofbox/calendar-sa"),
            ("BOOKING_TIMEZONE", "America/New_York"),
            ("REQUEST_TIMEOUT_SECS", "10"),
            ("APPOINTMENT_DURATION_MINUTES", "45"),
        ])
        .unwrap();
        assert_eq!(
            config.service_account_secret.as_deref(),
            Some("roofbox/calendar-sa")
        );
        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.appointment_duration, chrono::Duration::minutes(45));
    }

    #[test]
    fn test_blank_secret_is_unset() {
        let config = config_from(&[("GOOGLE_SERVICE_ACCOUNT_SECRET", "  ")]).unwrap();
        assert_eq!(config.service_account_secret, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("BOOKING_TIMEZONE", "Mars/Olympus")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_from(&[("REQUEST_TIMEOUT_SECS", "soon")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_from(&[("APPOINTMENT_DURATION_MINUTES", "0")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_oversized_appointment_duration() {
        let minutes = i64::MAX.to_string();
        let result = config_from(&[("APPOINTMENT_DURATION_MINUTES", minutes.as_str())]);
        assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("too large")));
    }
}
