//! Error types for `ignite-keyvault`.
//!
//! Variants carry enough context to diagnose a failed secret fetch from the
//! logs alone. Token values and secret values never appear in messages.

/// All errors that can occur while resolving credentials or reading secrets.
#[derive(Debug, thiserror::Error)]
pub enum KeyVaultError {
    /// A required process environment variable is missing or empty.
    #[error("{0} environment variable not set")]
    MissingEnvironment(&'static str),

    /// The identity authority did not hand back an access token for the
    /// certificate assertion.
    #[error(
        "Unable to acquire token for resource {resource}. Authority: {authority}. \
         ApplicationId: {application_id}. Thumbprint: {thumbprint}"
    )]
    TokenUnavailable {
        resource: String,
        authority: String,
        application_id: String,
        thumbprint: String,
    },

    /// No certificate in the store matches the configured thumbprint.
    #[error("certificate with thumbprint {thumbprint} not found in store '{store}'")]
    CertificateNotFound { thumbprint: String, store: String },

    /// A certificate file exists but cannot be used for signing.
    #[error("invalid certificate '{path}': {reason}")]
    InvalidCertificate { path: String, reason: String },

    /// Building or signing the client assertion failed.
    #[error("client assertion error: {0}")]
    Assertion(#[from] jsonwebtoken::errors::Error),

    /// The vault answered with a non-success status.
    #[error("key vault returned {status}: {message}")]
    Vault {
        /// HTTP status code returned by the vault.
        status: u16,
        /// Vault error code (e.g. `SecretNotFound`), when present.
        code: Option<String>,
        /// Human-readable message from the vault.
        message: String,
    },

    /// The vault rejected an anonymous request without a usable bearer challenge.
    #[error("invalid authentication challenge: {0}")]
    Challenge(String),

    /// Missing or inconsistent repository configuration.
    #[error("key vault config error: {0}")]
    Config(String),

    /// Network or HTTP client error.
    #[error("key vault network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON deserialization error.
    #[error("key vault json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the certificate store failed.
    #[error("certificate store io error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeyVaultError {
    /// Whether this error is the vault reporting that the secret does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Vault { status: 404, .. })
    }
}
