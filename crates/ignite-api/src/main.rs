//! Ignite API server entry point.
//!
//! Loads configuration, resolves the upstream API key from Key Vault when
//! one is configured, then starts the Axum HTTP server with graceful
//! shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use ignite_api::config::ServerConfig;
use ignite_api::routes;
use ignite_api::services::UpstreamUxoService;
use ignite_api::state::AppState;
use ignite_keyvault::KeyVaultSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(upstream = %config.upstream_url, "Ignite API starting");

    for (variable, value) in &config.ignored {
        warn!(variable, value = %value, "ignoring malformed setting, using default");
    }

    if config.token_hashes.is_empty() {
        warn!("IGNITE_API_TOKEN_HASHES is empty, every UXO request will be rejected");
    }

    let api_key = match config.upstream_key_secret.as_deref() {
        Some(secret) => upstream_key(secret).await?,
        None => None,
    };

    let upstream = Arc::new(
        UpstreamUxoService::new(&config.upstream_url, config.upstream_timeout, api_key)
            .context("failed to build upstream client")?,
    );

    let state = Arc::new(AppState::new(
        upstream.clone(),
        upstream,
        config.token_hashes.clone(),
    ));
    let app = routes::app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Ignite API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Ignite API stopped");
    Ok(())
}

/// Read the upstream API key from Key Vault. An empty secret is not fatal.
async fn upstream_key(secret: &str) -> anyhow::Result<Option<String>> {
    let settings = KeyVaultSettings::from_env().context("invalid Key Vault settings")?;
    let repository =
        ignite_keyvault::repository(&settings, None).context("failed to build Key Vault repository")?;
    let key = repository
        .get(secret)
        .await
        .with_context(|| format!("failed to read secret '{secret}' from Key Vault"))?;

    if key.is_empty() {
        warn!(secret, "upstream key secret is missing or empty, continuing without a key");
        return Ok(None);
    }
    info!(secret, "resolved upstream key from Key Vault");
    Ok(Some(key))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
