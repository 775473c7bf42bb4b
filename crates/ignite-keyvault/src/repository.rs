//! Secret repository bound to one vault.
//!
//! Every call goes to the vault; nothing is cached. A missing secret is an
//! absent result, not an error.

use tracing::{info, warn};

use crate::client::{KeyVaultClient, SecretClient};
use crate::error::KeyVaultError;
use crate::types::SecretBundle;

/// Reads secrets from the vault at a fixed base URL.
#[derive(Debug)]
pub struct KeyVaultRepository<C = KeyVaultClient> {
    client: C,
    vault_url: String,
}

impl<C: SecretClient> KeyVaultRepository<C> {
    /// Create a repository reading from `vault_url` through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::Config`] if `vault_url` is empty.
    pub fn new(client: C, vault_url: impl Into<String>) -> Result<Self, KeyVaultError> {
        let vault_url = vault_url.into();
        if vault_url.trim().is_empty() {
            return Err(KeyVaultError::Config("vault url must not be empty".to_owned()));
        }
        Ok(Self { client, vault_url })
    }

    /// Base URL of the vault this repository reads from.
    #[must_use]
    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }

    /// The underlying vault client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch a secret's value.
    ///
    /// A missing secret and a secret whose value is empty both yield `""`.
    ///
    /// # Errors
    ///
    /// Propagates every error from [`get_secret_bundle`](Self::get_secret_bundle).
    pub async fn get(&self, name: &str) -> Result<String, KeyVaultError> {
        Ok(self
            .get_secret_bundle(name)
            .await?
            .map(|bundle| bundle.value)
            .unwrap_or_default())
    }

    /// Fetch the full secret bundle.
    ///
    /// Returns `Ok(None)` if the vault reports the secret does not exist.
    ///
    /// # Errors
    ///
    /// Any vault error other than not-found is returned unchanged.
    pub async fn get_secret_bundle(
        &self,
        name: &str,
    ) -> Result<Option<SecretBundle>, KeyVaultError> {
        info!("Looking for secret '{name}'");
        match self.client.get_secret(&self.vault_url, name).await {
            Ok(bundle) => {
                info!("Found secret '{name}'");
                Ok(Some(bundle))
            }
            Err(err) if err.is_not_found() => {
                warn!("Secret '{name}' was not found");
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, "Unable to retrieve '{name}'");
                Err(err)
            }
        }
    }
}
