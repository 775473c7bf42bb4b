//! Certificate-based Azure AD authentication.
//!
//! Exchanges an RS256 client assertion signed with a stored certificate for
//! an access token at the challenge authority's `/oauth2/token` endpoint.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::{error, info, warn};

use super::store::{CertificateStore, StoredCertificate};
use crate::error::KeyVaultError;
use crate::types::{AuthChallenge, TokenResponse};

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Lifetime of a client assertion, in seconds.
const ASSERTION_LIFETIME_SECS: i64 = 600;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    aud: &'a str,
    iss: &'a str,
    sub: &'a str,
    jti: String,
    nbf: i64,
    exp: i64,
}

/// Acquires vault tokens with a certificate client assertion.
#[derive(Debug, Clone)]
pub struct CertificateCredential {
    application_id: String,
    thumbprint: String,
    store: CertificateStore,
    http: reqwest::Client,
}

impl CertificateCredential {
    /// Create a credential for the AD application `application_id` using
    /// the certificate with `thumbprint` from `store`.
    pub fn new(
        application_id: impl Into<String>,
        thumbprint: impl Into<String>,
        store: CertificateStore,
        http: reqwest::Client,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            thumbprint: thumbprint.into(),
            store,
            http,
        }
    }

    /// The AD application id the assertion is issued for.
    #[must_use]
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// The configured certificate thumbprint, as given.
    #[must_use]
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Obtain an access token for the challenge's resource.
    ///
    /// # Errors
    ///
    /// - [`KeyVaultError::TokenUnavailable`] if the authority answers without
    ///   an access token.
    /// - [`KeyVaultError::CertificateNotFound`] / [`KeyVaultError::InvalidCertificate`]
    ///   if the certificate cannot be loaded.
    /// - [`KeyVaultError::Assertion`] if signing fails.
    /// - [`KeyVaultError::Network`] if the token endpoint is unreachable.
    pub async fn get_token(&self, challenge: &AuthChallenge) -> Result<String, KeyVaultError> {
        let certificate = self.store.find_by_thumbprint(&self.thumbprint).await?;
        let token_endpoint = format!("{}/oauth2/token", challenge.authority);
        let assertion = client_assertion(&certificate, &self.application_id, &token_endpoint)?;

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.application_id.as_str()),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion.as_str()),
            ("resource", challenge.resource.as_str()),
        ];

        let response = self.http.post(&token_endpoint).form(&params).send().await?;
        let status = response.status();

        let token = if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str::<TokenResponse>(&body)
                .ok()
                .and_then(|t| t.access_token)
                .filter(|t| !t.is_empty())
        } else {
            warn!(status = status.as_u16(), authority = %challenge.authority, "token endpoint rejected client assertion");
            None
        };

        let Some(token) = token else {
            error!("Failed to obtain access token using certificate");
            return Err(KeyVaultError::TokenUnavailable {
                resource: challenge.resource.clone(),
                authority: challenge.authority.clone(),
                application_id: self.application_id.clone(),
                thumbprint: self.thumbprint.clone(),
            });
        };

        info!(
            subject = %certificate.subject,
            path = %certificate.path.display(),
            "Obtained access token using certificate"
        );
        Ok(token)
    }
}

/// Build the signed JWT that proves possession of the certificate.
fn client_assertion(
    certificate: &StoredCertificate,
    application_id: &str,
    audience: &str,
) -> Result<String, KeyVaultError> {
    let now = chrono::Utc::now().timestamp();
    let claims = AssertionClaims {
        aud: audience,
        iss: application_id,
        sub: application_id,
        jti: uuid::Uuid::new_v4().to_string(),
        nbf: now,
        exp: now.saturating_add(ASSERTION_LIFETIME_SECS),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.x5t = Some(URL_SAFE_NO_PAD.encode(&certificate.sha1));

    let key = EncodingKey::from_rsa_pem(certificate.private_key_pem.as_bytes())?;
    Ok(jsonwebtoken::encode(&header, &claims, &key)?)
}
