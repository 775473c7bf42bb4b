//! Token acquisition strategies for the vault.
//!
//! The strategy is picked once when a repository is built and stays fixed
//! for that repository's lifetime.

mod certificate;
mod managed_identity;
mod store;

pub use certificate::CertificateCredential;
pub use managed_identity::{
    MSI_API_VERSION, MSI_ENDPOINT_VAR, MSI_SECRET_VAR, ManagedIdentityCredential,
};
pub use store::{CertificateStore, StoredCertificate, normalize_thumbprint};

use crate::error::KeyVaultError;
use crate::types::AuthChallenge;

/// How a repository authenticates against the vault.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Azure AD client assertion signed with a stored certificate.
    Certificate(CertificateCredential),
    /// Platform managed identity endpoint.
    ManagedIdentity(ManagedIdentityCredential),
}

impl Credential {
    /// Obtain a bearer token satisfying `challenge`.
    ///
    /// # Errors
    ///
    /// Propagates the strategy's hard failures. A managed identity soft
    /// failure yields `Ok` with an empty token.
    pub async fn get_token(&self, challenge: &AuthChallenge) -> Result<String, KeyVaultError> {
        match self {
            Self::Certificate(c) => c.get_token(challenge).await,
            Self::ManagedIdentity(m) => m.get_token(&challenge.resource).await,
        }
    }

    /// Short strategy name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Certificate(_) => "certificate",
            Self::ManagedIdentity(_) => "managed_identity",
        }
    }
}

impl From<CertificateCredential> for Credential {
    fn from(c: CertificateCredential) -> Self {
        Self::Certificate(c)
    }
}

impl From<ManagedIdentityCredential> for Credential {
    fn from(m: ManagedIdentityCredential) -> Self {
        Self::ManagedIdentity(m)
    }
}
