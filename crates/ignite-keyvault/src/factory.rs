//! Repository construction from settings.
//!
//! A configured certificate thumbprint selects certificate authentication;
//! otherwise the repository authenticates with the managed identity.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::client::KeyVaultClient;
use crate::credential::{
    CertificateCredential, CertificateStore, Credential, ManagedIdentityCredential,
};
use crate::environment::CloudEnvironment;
use crate::error::KeyVaultError;
use crate::repository::KeyVaultRepository;

const DEFAULT_CERT_STORE: &str = "./certs";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Key Vault connection settings.
#[derive(Debug, Clone)]
pub struct KeyVaultSettings {
    /// Vault short name (the `{name}` in `https://{name}.vault.azure.net`).
    pub name: Option<String>,
    /// Azure AD application id. Doubles as the user-assigned identity
    /// client id when authenticating with the managed identity.
    pub ad_application_id: Option<String>,
    /// Certificate thumbprint. Selects certificate authentication when set.
    pub thumbprint: Option<String>,
    /// Cloud the vault lives in.
    pub cloud: CloudEnvironment,
    /// Directory holding PEM certificates for certificate authentication.
    pub certificate_store: PathBuf,
    /// Timeout for vault, authority and identity endpoint requests.
    pub timeout: Duration,
}

impl Default for KeyVaultSettings {
    fn default() -> Self {
        Self {
            name: None,
            ad_application_id: None,
            thumbprint: None,
            cloud: CloudEnvironment::default(),
            certificate_store: PathBuf::from(DEFAULT_CERT_STORE),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl KeyVaultSettings {
    /// Load settings from the process environment.
    ///
    /// Environment variables:
    /// - `KEYVAULT_NAME`: vault short name
    /// - `KEYVAULT_AD_APPLICATION_ID`: AD application / identity client id
    /// - `KEYVAULT_THUMBPRINT`: certificate thumbprint
    /// - `KEYVAULT_CLOUD`: `commercial` or `government` (default: `commercial`)
    /// - `KEYVAULT_CERT_STORE`: certificate directory (default: `./certs`)
    /// - `KEYVAULT_TIMEOUT_SECS`: request timeout (default: `30`)
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::Config`] if `KEYVAULT_CLOUD` is not a known cloud.
    pub fn from_env() -> Result<Self, KeyVaultError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::Config`] if `KEYVAULT_CLOUD` is not a known cloud.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, KeyVaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cloud = match non_empty("KEYVAULT_CLOUD") {
            Some(raw) => raw.parse()?,
            None => CloudEnvironment::default(),
        };

        let timeout = non_empty("KEYVAULT_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            name: non_empty("KEYVAULT_NAME"),
            ad_application_id: non_empty("KEYVAULT_AD_APPLICATION_ID"),
            thumbprint: non_empty("KEYVAULT_THUMBPRINT"),
            cloud,
            certificate_store: non_empty("KEYVAULT_CERT_STORE")
                .map_or_else(|| PathBuf::from(DEFAULT_CERT_STORE), PathBuf::from),
            timeout,
        })
    }

    /// Base URL of `vault_name`, or of the configured vault, in the configured cloud.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::Config`] if neither name is available.
    pub fn vault_url(&self, vault_name: Option<&str>) -> Result<String, KeyVaultError> {
        let name = vault_name
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref())
            .ok_or_else(|| {
                KeyVaultError::Config(
                    "missing vault name, set KEYVAULT_NAME or pass a vault name".to_owned(),
                )
            })?;
        Ok(self.cloud.vault_url(name))
    }
}

/// Build a repository for `vault_name` (or the configured vault).
///
/// # Errors
///
/// - [`KeyVaultError::Config`] if no vault name is available, or if a
///   thumbprint is configured without an application id.
/// - [`KeyVaultError::Network`] if the HTTP client cannot be built.
pub fn repository(
    settings: &KeyVaultSettings,
    vault_name: Option<&str>,
) -> Result<KeyVaultRepository, KeyVaultError> {
    let vault_url = settings.vault_url(vault_name)?;
    let http = reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(concat!("ignite-keyvault/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let credential: Credential = match settings.thumbprint.as_deref() {
        Some(thumbprint) if !thumbprint.is_empty() => {
            info!(vault = %vault_url, cloud = %settings.cloud, "Creating certificate based Key Vault repository");
            let application_id = settings.ad_application_id.clone().ok_or_else(|| {
                KeyVaultError::Config(
                    "certificate authentication requires KEYVAULT_AD_APPLICATION_ID".to_owned(),
                )
            })?;
            CertificateCredential::new(
                application_id,
                thumbprint,
                CertificateStore::new(&settings.certificate_store),
                http.clone(),
            )
            .into()
        }
        _ => {
            info!(vault = %vault_url, cloud = %settings.cloud, "Creating MSI based Key Vault repository");
            ManagedIdentityCredential::new(settings.ad_application_id.clone(), http.clone()).into()
        }
    };

    KeyVaultRepository::new(KeyVaultClient::new(credential, http), vault_url)
}
