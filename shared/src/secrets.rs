//! Secret store integration.

use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsClient;

use crate::{Error, Result};

/// Read-only access to the latest version of a named secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the raw payload of the current version of `secret_id`.
    async fn fetch_latest(&self, secret_id: &str) -> Result<Vec<u8>>;
}

/// AWS Secrets Manager backed [`SecretStore`].
pub struct AwsSecretStore {
    client: SecretsClient,
}

impl AwsSecretStore {
    pub fn new(client: SecretsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn fetch_latest(&self, secret_id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| Error::SecretUnavailable(format!("Failed to get secret: {}", e)))?;

        if let Some(value) = response.secret_string() {
            return Ok(value.as_bytes().to_vec());
        }

        response
            .secret_binary()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| Error::SecretUnavailable("Secret has no value".to_string()))
    }
}
