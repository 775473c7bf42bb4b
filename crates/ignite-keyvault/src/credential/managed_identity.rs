//! Managed identity (MSI) token acquisition.
//!
//! Talks to the App Service style identity endpoint announced through the
//! `MSI_ENDPOINT` and `MSI_SECRET` process environment variables. A
//! non-success answer from the endpoint is a soft failure: the caller gets an
//! empty token and the vault will reject the request that uses it.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::KeyVaultError;

/// Environment variable holding the identity endpoint URL.
pub const MSI_ENDPOINT_VAR: &str = "MSI_ENDPOINT";
/// Environment variable holding the shared secret for the identity endpoint.
pub const MSI_SECRET_VAR: &str = "MSI_SECRET";
/// API version understood by the identity endpoint.
pub const MSI_API_VERSION: &str = "2017-09-01";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Deserialize)]
struct MsiTokenResponse {
    access_token: String,
}

/// Acquires vault tokens from the managed identity endpoint.
#[derive(Clone)]
pub struct ManagedIdentityCredential {
    client_id: Option<String>,
    http: reqwest::Client,
    env: EnvLookup,
}

impl std::fmt::Debug for ManagedIdentityCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedIdentityCredential")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ManagedIdentityCredential {
    /// Create a credential for the system-assigned identity, or for the
    /// user-assigned identity `client_id` when one is given.
    pub fn new(client_id: Option<String>, http: reqwest::Client) -> Self {
        Self {
            client_id: client_id.filter(|id| !id.is_empty()),
            http,
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the process environment lookup.
    #[must_use]
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// The user-assigned identity client id, if any.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Obtain an access token for `resource`.
    ///
    /// Returns an empty string if the endpoint answers with a non-success
    /// status.
    ///
    /// # Errors
    ///
    /// - [`KeyVaultError::MissingEnvironment`] if `MSI_ENDPOINT` or
    ///   `MSI_SECRET` is unset or empty.
    /// - [`KeyVaultError::Network`] if the endpoint is unreachable.
    /// - [`KeyVaultError::Json`] if a success body has no `access_token`.
    pub async fn get_token(&self, resource: &str) -> Result<String, KeyVaultError> {
        info!("Attempting to get token from MSI");

        let endpoint = self.required(MSI_ENDPOINT_VAR)?;
        let secret = self.required(MSI_SECRET_VAR)?;

        let mut query = vec![("resource", resource), ("api-version", MSI_API_VERSION)];
        if let Some(client_id) = self.client_id.as_deref() {
            info!("Obtain token using user assigned identity");
            query.push(("clientid", client_id));
        } else {
            info!("Obtain token using system assigned identity");
        }

        let response = self
            .http
            .get(&endpoint)
            .query(&query)
            .header("secret", secret)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Failed to obtain MSI access token");
            return Ok(String::new());
        }

        let body = response.text().await?;
        let parsed: MsiTokenResponse = serde_json::from_str(&body)?;
        info!("Obtained MSI access token");
        Ok(parsed.access_token)
    }

    fn required(&self, key: &'static str) -> Result<String, KeyVaultError> {
        match (self.env)(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => {
                warn!("{key} variable not set");
                Err(KeyVaultError::MissingEnvironment(key))
            }
        }
    }
}
