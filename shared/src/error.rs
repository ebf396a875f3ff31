//! Error types for the booking webhook Lambda.

use thiserror::Error;

use crate::calendar::CalendarError;
use crate::models::EventIds;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while processing a booking webhook.
#[derive(Error, Debug)]
pub enum Error {
    /// Webhook source header missing or wrong
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body could not be understood
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Secret store unreachable or secret id unset
    #[error("Secret unavailable: {0}")]
    SecretUnavailable(String),

    /// Secret payload is not a usable service-account key
    #[error("Credential malformed: {0}")]
    CredentialMalformed(String),

    /// Token endpoint refused the signed assertion
    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    /// Booking date or appointment could not be normalized
    #[error("Invalid date format: {0}")]
    DateFormatInvalid(String),

    /// A calendar call failed after `partial` identifiers were already produced
    #[error("Calendar operation failed: {source}")]
    CalendarOperationFailed {
        partial: EventIds,
        #[source]
        source: CalendarError,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Unauthorized => 401,
            _ => 500,
        }
    }

    /// Whether cached Google credentials should be dropped after this error.
    pub fn should_refresh_credentials(&self) -> bool {
        match self {
            Error::CalendarOperationFailed { source, .. } => source.should_refresh_credentials(),
            Error::CredentialRejected(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Unauthorized.status_code(), 401);
        assert_eq!(Error::Validation("bad".into()).status_code(), 400);
        assert_eq!(Error::DateFormatInvalid("x".into()).status_code(), 500);
        assert_eq!(Error::SecretUnavailable("x".into()).status_code(), 500);
    }

    #[test]
    fn test_refresh_only_on_auth_failures() {
        let err = Error::CalendarOperationFailed {
            partial: EventIds::default(),
            source: CalendarError::Unauthorized,
        };
        assert!(err.should_refresh_credentials());

        let err = Error::CalendarOperationFailed {
            partial: EventIds::default(),
            source: CalendarError::Api("500: boom".into()),
        };
        assert!(!err.should_refresh_credentials());
        assert!(!Error::CredentialMalformed("x".into()).should_refresh_credentials());
    }
}
