//! Public types for the Key Vault secret surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::KeyVaultError;

/// A secret as returned by the vault's `GET /secrets/{name}` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBundle {
    /// The secret value.
    #[serde(default)]
    pub value: String,
    /// Full secret identifier, including the version.
    #[serde(default)]
    pub id: Option<String>,
    /// Optional content type set by whoever wrote the secret.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Lifecycle attributes.
    #[serde(default)]
    pub attributes: Option<SecretAttributes>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Lifecycle attributes of a secret. Timestamps are Unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretAttributes {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default, rename = "exp")]
    pub expires: Option<i64>,
    #[serde(default)]
    pub recovery_level: Option<String>,
}

/// Where and for what to obtain a token, as announced by the vault in a
/// `WWW-Authenticate: Bearer ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// Identity authority URL (e.g. `https://login.windows.net/<tenant>`).
    pub authority: String,
    /// Resource the token must be issued for (e.g. `https://vault.azure.net`).
    pub resource: String,
    /// OAuth scope, when the vault sent one.
    pub scope: Option<String>,
}

impl AuthChallenge {
    /// Parse a `WWW-Authenticate` header value.
    ///
    /// Accepts both `authorization` and `authorization_uri` for the authority
    /// and derives the resource from `scope` when `resource` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::Challenge`] if the header is not a bearer
    /// challenge or lacks an authority or resource.
    pub fn parse(header: &str) -> Result<Self, KeyVaultError> {
        let trimmed = header.trim();
        let params = match trimmed.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest,
            _ => {
                return Err(KeyVaultError::Challenge(format!(
                    "expected a Bearer challenge, got '{trimmed}'"
                )));
            }
        };

        let mut authority = None;
        let mut resource = None;
        let mut scope = None;

        for pair in params.split(',') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_owned();
            match key.trim().to_ascii_lowercase().as_str() {
                "authorization" | "authorization_uri" => authority = Some(value),
                "resource" => resource = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let authority = authority
            .filter(|a| !a.is_empty())
            .ok_or_else(|| KeyVaultError::Challenge("challenge has no authority".to_owned()))?;

        let resource = resource
            .or_else(|| {
                scope
                    .as_deref()
                    .map(|s| s.trim_end_matches("/.default").to_owned())
            })
            .filter(|r| !r.is_empty())
            .ok_or_else(|| KeyVaultError::Challenge("challenge has no resource".to_owned()))?;

        Ok(Self {
            authority: authority.trim_end_matches('/').to_owned(),
            resource,
            scope,
        })
    }

    /// Check that the challenge asks for a token scoped to the vault at
    /// `vault_url`: the resource host must equal the vault host or be one of
    /// its parent domains.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::Challenge`] if either URL cannot be parsed or
    /// the resource does not cover the vault host.
    pub fn verify_resource(&self, vault_url: &str) -> Result<(), KeyVaultError> {
        let host = |raw: &str| {
            reqwest::Url::parse(raw)
                .ok()
                .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
                .filter(|h| !h.is_empty())
                .ok_or_else(|| KeyVaultError::Challenge(format!("'{raw}' is not an absolute URL")))
        };
        let vault_host = host(vault_url)?;
        let resource_host = host(&self.resource)?;

        if vault_host == resource_host || vault_host.ends_with(&format!(".{resource_host}")) {
            return Ok(());
        }
        Err(KeyVaultError::Challenge(format!(
            "challenge resource '{}' does not match vault host '{vault_host}'",
            self.resource
        )))
    }
}

// --- Internal wire types ---

#[derive(Deserialize)]
pub(crate) struct VaultErrorBody {
    pub error: Option<VaultErrorDetail>,
}

#[derive(Deserialize)]
pub(crate) struct VaultErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_classic_vault_challenge() {
        let challenge = AuthChallenge::parse(
            r#"Bearer authorization="https://login.windows.net/72f988bf", resource="https://vault.azure.net""#,
        )
        .unwrap();
        assert_eq!(challenge.authority, "https://login.windows.net/72f988bf");
        assert_eq!(challenge.resource, "https://vault.azure.net");
        assert_eq!(challenge.scope, None);
    }

    #[test]
    fn derives_resource_from_scope() {
        let challenge = AuthChallenge::parse(
            r#"Bearer authorization_uri="https://login.microsoftonline.us/tenant/", scope="https://vault.usgovcloudapi.net/.default""#,
        )
        .unwrap();
        assert_eq!(challenge.authority, "https://login.microsoftonline.us/tenant");
        assert_eq!(challenge.resource, "https://vault.usgovcloudapi.net");
        assert_eq!(
            challenge.scope.as_deref(),
            Some("https://vault.usgovcloudapi.net/.default")
        );
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let err = AuthChallenge::parse(r#"Basic realm="vault""#).unwrap_err();
        assert!(matches!(err, KeyVaultError::Challenge(_)));
    }

    #[test]
    fn rejects_challenge_without_authority() {
        let err = AuthChallenge::parse(r#"Bearer resource="https://vault.azure.net""#).unwrap_err();
        assert!(matches!(err, KeyVaultError::Challenge(_)));
    }

    fn challenge_for(resource: &str) -> AuthChallenge {
        AuthChallenge {
            authority: "https://login.windows.net/tenant".to_owned(),
            resource: resource.to_owned(),
            scope: None,
        }
    }

    #[test]
    fn resource_covering_vault_host_is_accepted() {
        challenge_for("https://vault.azure.net")
            .verify_resource("https://ignite-kv.vault.azure.net")
            .unwrap();
        challenge_for("https://Vault.UsGovCloudApi.net")
            .verify_resource("https://ignite-kv.vault.usgovcloudapi.net/")
            .unwrap();
    }

    #[test]
    fn resource_for_another_host_is_rejected() {
        for resource in [
            "https://attacker.example",
            "https://evilvault.azure.net",
            "https://ignite-kv.vault.azure.net.attacker.example",
            "not a url",
        ] {
            let err = challenge_for(resource)
                .verify_resource("https://ignite-kv.vault.azure.net")
                .unwrap_err();
            assert!(matches!(err, KeyVaultError::Challenge(_)), "{resource}");
        }
    }

    #[test]
    fn secret_bundle_reads_vault_json() {
        let bundle: SecretBundle = serde_json::from_str(
            r#"{
                "value": "s3cr3t",
                "id": "https://kv.vault.azure.net/secrets/db/abc",
                "contentType": "text/plain",
                "attributes": {"enabled": true, "created": 1493938410, "updated": 1493938411, "recoveryLevel": "Recoverable"},
                "tags": {"owner": "ops"}
            }"#,
        )
        .unwrap();
        assert_eq!(bundle.value, "s3cr3t");
        assert_eq!(bundle.content_type.as_deref(), Some("text/plain"));
        let attributes = bundle.attributes.unwrap();
        assert_eq!(attributes.enabled, Some(true));
        assert_eq!(attributes.recovery_level.as_deref(), Some("Recoverable"));
        assert_eq!(bundle.tags.get("owner").map(String::as_str), Some("ops"));
    }
}
