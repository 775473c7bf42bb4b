//! Vault REST client.
//!
//! [`SecretClient`] is the seam the repository talks to. [`KeyVaultClient`]
//! implements it against the Key Vault REST API, performing the bearer
//! challenge handshake: an anonymous request draws a `401` naming the
//! authority and resource, the configured [`Credential`] turns that into a
//! token, and the request is sent once more with the token attached. A
//! challenge whose resource does not cover the vault host is refused before
//! any credential is used.

use async_trait::async_trait;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::credential::Credential;
use crate::error::KeyVaultError;
use crate::types::{AuthChallenge, SecretBundle, VaultErrorBody};

/// Key Vault secrets API version.
pub const SECRETS_API_VERSION: &str = "7.4";

/// Reads secrets from a vault.
///
/// Implementations must surface a missing secret as a
/// [`KeyVaultError::Vault`] with status `404` so callers can tell it apart
/// from other failures.
#[async_trait]
pub trait SecretClient: Send + Sync + 'static {
    /// Fetch the current version of secret `name` from the vault at `vault_url`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::Vault`] for any non-success vault answer and
    /// credential or transport errors otherwise.
    async fn get_secret(&self, vault_url: &str, name: &str) -> Result<SecretBundle, KeyVaultError>;
}

/// Key Vault REST client authenticating with a [`Credential`].
#[derive(Debug, Clone)]
pub struct KeyVaultClient {
    credential: Credential,
    http: reqwest::Client,
}

impl KeyVaultClient {
    /// Create a client that authenticates with `credential`.
    pub fn new(credential: Credential, http: reqwest::Client) -> Self {
        Self { credential, http }
    }

    /// The credential this client authenticates with.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    async fn send(&self, url: &str, token: Option<&str>) -> Result<Response, KeyVaultError> {
        let mut req = self
            .http
            .get(url)
            .query(&[("api-version", SECRETS_API_VERSION)]);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Ok(req.send().await?)
    }
}

#[async_trait]
impl SecretClient for KeyVaultClient {
    async fn get_secret(&self, vault_url: &str, name: &str) -> Result<SecretBundle, KeyVaultError> {
        let url = format!(
            "{}/secrets/{}",
            vault_url.trim_end_matches('/'),
            urlencoding::encode(name)
        );

        let mut response = self.send(&url, None).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = challenge_from(&response)?;
            challenge.verify_resource(vault_url)?;
            debug!(
                authority = %challenge.authority,
                resource = %challenge.resource,
                credential = self.credential.kind(),
                "vault issued bearer challenge"
            );
            let token = self.credential.get_token(&challenge).await?;
            response = self.send(&url, Some(&token)).await?;
        }

        read_bundle(response).await
    }
}

fn challenge_from(response: &Response) -> Result<AuthChallenge, KeyVaultError> {
    let header = response
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            KeyVaultError::Challenge("vault returned 401 without a WWW-Authenticate header".to_owned())
        })?;
    AuthChallenge::parse(header)
}

async fn read_bundle(response: Response) -> Result<SecretBundle, KeyVaultError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&text)?);
    }

    let detail = serde_json::from_str::<VaultErrorBody>(&text)
        .ok()
        .and_then(|b| b.error);
    let code = detail.as_ref().and_then(|d| d.code.clone());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    Err(KeyVaultError::Vault {
        status: status.as_u16(),
        code,
        message,
    })
}
