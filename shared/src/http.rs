//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    data: &T,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?;

    Ok(response)
}

/// Parse a request body as JSON.
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response() {
        let response = json_response(201, &serde_json::json!({"ok": true})).unwrap();
        assert_eq!(response.status().as_u16(), 201);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_parse_json_body() {
        let value: serde_json::Value = parse_json_body(br#"{"rowId": 1}"#).unwrap();
        assert_eq!(value["rowId"], 1);

        let result: Result<serde_json::Value> = parse_json_body(b"{");
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
