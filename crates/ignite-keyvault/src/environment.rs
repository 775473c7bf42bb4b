//! Azure cloud selection for vault URLs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyVaultError;

/// The Azure cloud a vault lives in. Clouds differ only in the vault DNS suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudEnvironment {
    /// Azure commercial cloud (`*.vault.azure.net`).
    #[default]
    Commercial,
    /// Azure US Government cloud (`*.vault.usgovcloudapi.net`).
    Government,
}

impl CloudEnvironment {
    /// DNS suffix appended to the vault short name.
    #[must_use]
    pub fn vault_suffix(self) -> &'static str {
        match self {
            Self::Commercial => "vault.azure.net",
            Self::Government => "vault.usgovcloudapi.net",
        }
    }

    /// Base URL of the vault called `vault_name` in this cloud.
    #[must_use]
    pub fn vault_url(self, vault_name: &str) -> String {
        format!("https://{vault_name}.{}", self.vault_suffix())
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commercial => f.write_str("commercial"),
            Self::Government => f.write_str("government"),
        }
    }
}

impl FromStr for CloudEnvironment {
    type Err = KeyVaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commercial" | "azurecommercial" | "public" => Ok(Self::Commercial),
            "government" | "azuregovernment" | "usgov" => Ok(Self::Government),
            other => Err(KeyVaultError::Config(format!(
                "unknown cloud environment '{other}', expected 'commercial' or 'government'"
            ))),
        }
    }
}
