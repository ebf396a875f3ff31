//! Webhook source authentication.

use lambda_http::http::HeaderMap;
use tracing::warn;

use crate::{Error, Result};

/// Check that the request carries `header` with exactly `expected`.
pub fn verify_webhook_source(headers: &HeaderMap, header: &str, expected: &str) -> Result<()> {
    let provided = headers.get(header).and_then(|v| v.to_str().ok());

    match provided {
        Some(value) if value == expected => Ok(()),
        Some(value) => {
            warn!("Rejected webhook from unexpected source '{}'", value);
            Err(Error::Unauthorized)
        }
        None => {
            warn!("Rejected webhook without {} header", header);
            Err(Error::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::HeaderValue;

    #[test]
    fn test_source_header() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            verify_webhook_source(&headers, "x-webhook-source", "roofbox-webhook-router"),
            Err(Error::Unauthorized)
        ));

        headers.insert("x-webhook-source", HeaderValue::from_static("someone-else"));
        assert!(
            verify_webhook_source(&headers, "x-webhook-source", "roofbox-webhook-router").is_err()
        );

        headers.insert("x-webhook-source", HeaderValue::from_static("roofbox-webhook-router"));
        assert!(
            verify_webhook_source(&headers, "x-webhook-source", "roofbox-webhook-router").is_ok()
        );
    }
}
