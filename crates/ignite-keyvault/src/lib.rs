//! Azure Key Vault secret access for Ignite services.
//!
//! A [`KeyVaultRepository`] reads secrets from one vault. It is built by
//! [`repository`] from [`KeyVaultSettings`], which picks the authentication
//! strategy: a certificate client assertion when a thumbprint is configured,
//! the platform managed identity otherwise.
//!
//! ```text
//! caller → factory → KeyVaultRepository → KeyVaultClient
//!                                          ├── anonymous GET → 401 challenge
//!                                          ├── Credential::get_token (authority / MSI endpoint)
//!                                          └── GET with bearer token → SecretBundle
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use ignite_keyvault::{KeyVaultSettings, repository};
//!
//! # async fn example() -> Result<(), ignite_keyvault::KeyVaultError> {
//! let settings = KeyVaultSettings::from_env()?;
//! let repo = repository(&settings, None)?;
//! let connection_string = repo.get("SqlConnectionString").await?;
//! # let _ = connection_string;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credential;
pub mod environment;
pub mod error;
pub mod factory;
pub mod repository;
pub mod types;

pub use client::{KeyVaultClient, SECRETS_API_VERSION, SecretClient};
pub use credential::{
    CertificateCredential, CertificateStore, Credential, ManagedIdentityCredential,
};
pub use environment::CloudEnvironment;
pub use error::KeyVaultError;
pub use factory::{KeyVaultSettings, repository};
pub use repository::KeyVaultRepository;
pub use types::{AuthChallenge, SecretAttributes, SecretBundle};
