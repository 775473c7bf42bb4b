//! Shared application state for the Ignite API.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. Nothing in it changes after startup.

use std::collections::HashSet;
use std::sync::Arc;

use crate::services::{UxoDocumentService, UxoService};

/// Shared state handed to every handler.
pub struct AppState {
    /// UXO data service.
    pub uxos: Arc<dyn UxoService>,
    /// Document generation service.
    pub documents: Arc<dyn UxoDocumentService>,
    /// SHA-256 hex digests of accepted bearer tokens.
    pub token_hashes: HashSet<String>,
}

impl AppState {
    /// Build state from the two collaborators and the accepted token digests.
    pub fn new(
        uxos: Arc<dyn UxoService>,
        documents: Arc<dyn UxoDocumentService>,
        token_hashes: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            uxos,
            documents,
            token_hashes: token_hashes
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }
}
