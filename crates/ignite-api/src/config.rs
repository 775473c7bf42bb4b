//! Server configuration for the Ignite API.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Key Vault settings live in [`ignite_keyvault::KeyVaultSettings`] and are
//! loaded separately.

use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8081";
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Lowercase SHA-256 hex digests of the accepted bearer tokens.
    pub token_hashes: Vec<String>,
    /// Base URL of the UXO data and document service.
    pub upstream_url: String,
    /// Timeout for upstream requests.
    pub upstream_timeout: Duration,
    /// Key Vault secret holding the upstream API key, if any.
    pub upstream_key_secret: Option<String>,
    /// Variables whose values were malformed and replaced by defaults, as
    /// `(name, value)`. Logged once logging is up.
    pub ignored: Vec<(&'static str, String)>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on, binds to `0.0.0.0`
    /// - `IGNITE_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8080`)
    /// - `IGNITE_LOG_LEVEL`: log filter (default: `info`)
    /// - `IGNITE_API_TOKEN_HASHES`: comma-separated SHA-256 hex token digests
    /// - `IGNITE_UPSTREAM_URL`: UXO service base URL (default: `http://127.0.0.1:8081`)
    /// - `IGNITE_UPSTREAM_TIMEOUT_SECS`: upstream timeout (default: `30`)
    /// - `IGNITE_UPSTREAM_KEY_SECRET`: Key Vault secret name of the upstream API key
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut ignored = Vec::new();
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));

        // IGNITE_BIND_ADDR > PORT > default
        let bind_addr = if let Some(addr) = var("IGNITE_BIND_ADDR") {
            addr.parse().unwrap_or_else(|_| {
                ignored.push(("IGNITE_BIND_ADDR", addr));
                default_addr
            })
        } else if let Some(port) = var("PORT") {
            let port = port.parse().unwrap_or_else(|_| {
                ignored.push(("PORT", port));
                DEFAULT_PORT
            });
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            default_addr
        };

        let token_hashes = var("IGNITE_API_TOKEN_HASHES")
            .map(|raw| {
                raw.split(',')
                    .map(|h| h.trim().to_ascii_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let upstream_timeout = match var("IGNITE_UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    ignored.push(("IGNITE_UPSTREAM_TIMEOUT_SECS", raw));
                    DEFAULT_UPSTREAM_TIMEOUT
                }
            },
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };

        Self {
            bind_addr,
            log_level: var("IGNITE_LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            token_hashes,
            upstream_url: var("IGNITE_UPSTREAM_URL")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_owned()),
            upstream_timeout,
            upstream_key_secret: var("IGNITE_UPSTREAM_KEY_SECRET"),
            ignored,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert!(config.token_hashes.is_empty());
        assert_eq!(config.upstream_url, "http://127.0.0.1:8081");
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.upstream_key_secret, None);
        assert!(config.ignored.is_empty());
    }

    #[test]
    fn port_binds_all_interfaces() {
        let config = config_from(&[("PORT", "9000")]);
        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse().unwrap());
    }

    #[test]
    fn bind_addr_overrides_port() {
        let config = config_from(&[("PORT", "9000"), ("IGNITE_BIND_ADDR", "10.0.0.5:7000")]);
        assert_eq!(config.bind_addr, "10.0.0.5:7000".parse().unwrap());
    }

    #[test]
    fn token_hashes_are_split_and_normalized() {
        let config = config_from(&[("IGNITE_API_TOKEN_HASHES", " ABC123 ,, def456")]);
        assert_eq!(config.token_hashes, vec!["abc123", "def456"]);
    }

    #[test]
    fn malformed_bind_addr_falls_back_and_is_reported() {
        let config = config_from(&[("IGNITE_BIND_ADDR", "localhost:eighty")]);
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(
            config.ignored,
            vec![("IGNITE_BIND_ADDR", "localhost:eighty".to_owned())]
        );
    }

    #[test]
    fn malformed_port_falls_back_and_is_reported() {
        let config = config_from(&[("PORT", "99999")]);
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.ignored, vec![("PORT", "99999".to_owned())]);
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        let config = config_from(&[("IGNITE_UPSTREAM_TIMEOUT_SECS", "0")]);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.ignored, vec![("IGNITE_UPSTREAM_TIMEOUT_SECS", "0".to_owned())]);
        let config = config_from(&[("IGNITE_UPSTREAM_TIMEOUT_SECS", "12")]);
        assert_eq!(config.upstream_timeout, Duration::from_secs(12));
    }
}
