//! Local certificate store lookup by thumbprint.
//!
//! The store is a directory of PEM files. Each usable entry holds one
//! `CERTIFICATE` block followed by the matching `PRIVATE KEY` (PKCS#8) or
//! `RSA PRIVATE KEY` (PKCS#1) block. The thumbprint of an entry is the
//! uppercase hex SHA-1 of the certificate DER, the same value Windows and
//! the Azure portal display.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};
use tracing::{debug, warn};
use x509_parser::pem::Pem;

use crate::error::KeyVaultError;

/// A certificate found in the store together with its signing key.
#[derive(Clone)]
pub struct StoredCertificate {
    /// Normalized uppercase hex thumbprint.
    pub thumbprint: String,
    /// Raw SHA-1 digest of the certificate DER (for the `x5t` header).
    pub sha1: Vec<u8>,
    /// Certificate subject, for logging.
    pub subject: String,
    /// File the certificate was loaded from.
    pub path: PathBuf,
    /// Private key re-encoded as PEM, ready for `jsonwebtoken`.
    pub(crate) private_key_pem: String,
}

impl std::fmt::Debug for StoredCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCertificate")
            .field("thumbprint", &self.thumbprint)
            .field("subject", &self.subject)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Directory-backed certificate store.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    root: PathBuf,
}

impl CertificateStore {
    /// Create a store rooted at `root`. The directory is read lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the certificate whose SHA-1 thumbprint equals `thumbprint`.
    ///
    /// Spaces, colons and invisible direction marks are ignored, and the
    /// comparison is case-insensitive.
    ///
    /// # Errors
    ///
    /// - [`KeyVaultError::Config`] if the thumbprint is not 40 hex digits.
    /// - [`KeyVaultError::CertificateNotFound`] if no entry matches.
    /// - [`KeyVaultError::InvalidCertificate`] if the matching entry has no
    ///   private key or cannot be parsed.
    /// - [`KeyVaultError::Io`] if the store directory cannot be read.
    pub async fn find_by_thumbprint(
        &self,
        thumbprint: &str,
    ) -> Result<StoredCertificate, KeyVaultError> {
        let wanted = normalize_thumbprint(thumbprint)?;

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pem") {
                continue;
            }

            let bytes = tokio::fs::read(&path).await?;
            if let Some(found) = match_entry(&path, &bytes, &wanted)? {
                debug!(thumbprint = %found.thumbprint, path = %path.display(), "certificate located");
                return Ok(found);
            }
        }

        Err(KeyVaultError::CertificateNotFound {
            thumbprint: wanted,
            store: self.root.display().to_string(),
        })
    }
}

/// Strip separators from a pasted thumbprint and uppercase it.
///
/// # Errors
///
/// Returns [`KeyVaultError::Config`] unless 40 hex digits remain.
pub fn normalize_thumbprint(raw: &str) -> Result<String, KeyVaultError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '\u{200e}')
        .collect::<String>()
        .to_ascii_uppercase();

    if cleaned.len() != 40 || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeyVaultError::Config(format!(
            "thumbprint '{raw}' is not a 40 digit hex SHA-1 digest"
        )));
    }
    Ok(cleaned)
}

fn match_entry(
    path: &Path,
    bytes: &[u8],
    wanted: &str,
) -> Result<Option<StoredCertificate>, KeyVaultError> {
    let invalid = |reason: String| KeyVaultError::InvalidCertificate {
        path: path.display().to_string(),
        reason,
    };

    let mut certificate_der: Option<Vec<u8>> = None;
    let mut private_key: Option<Pem> = None;

    for block in Pem::iter_from_buffer(bytes) {
        let block = match block {
            Ok(block) => block,
            Err(e) => {
                warn!(path = %path.display(), error = ?e, "skipping unreadable PEM file");
                return Ok(None);
            }
        };
        if block.label == "CERTIFICATE" && certificate_der.is_none() {
            certificate_der = Some(block.contents);
        } else if block.label.ends_with("PRIVATE KEY") && private_key.is_none() {
            private_key = Some(block);
        }
    }

    let Some(der) = certificate_der else {
        return Ok(None);
    };

    let sha1 = Sha1::digest(&der).to_vec();
    let thumbprint = hex::encode_upper(&sha1);
    if thumbprint != wanted {
        return Ok(None);
    }

    let (_, certificate) = x509_parser::parse_x509_certificate(&der)
        .map_err(|e| invalid(format!("malformed certificate: {e}")))?;
    let subject = certificate.subject().to_string();
    if !certificate.validity().is_valid() {
        warn!(thumbprint = %thumbprint, subject = %subject, "certificate is outside its validity period");
    }

    let key = private_key.ok_or_else(|| invalid("no private key alongside certificate".to_owned()))?;

    Ok(Some(StoredCertificate {
        thumbprint,
        sha1,
        subject,
        path: path.to_path_buf(),
        private_key_pem: encode_pem(&key.label, &key.contents),
    }))
}

fn encode_pem(label: &str, contents: &[u8]) -> String {
    let body = STANDARD.encode(contents);
    let mut pem = format!("-----BEGIN {label}-----\n");
    for line in body.as_bytes().chunks(64) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {label}-----\n"));
    pem
}
