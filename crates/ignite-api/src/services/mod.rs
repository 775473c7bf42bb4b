//! Collaborator seams for UXO data and document generation.
//!
//! Handlers only see these traits. [`UpstreamUxoService`] implements both
//! against an HTTP upstream; tests substitute in-memory fakes.

mod upstream;

pub use upstream::UpstreamUxoService;

use async_trait::async_trait;

use crate::models::{Uxo, UxoMapItem};

/// Failure inside a collaborator. The message is for logs only.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Transport-level failure talking to the upstream.
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream error {status}: {message}")]
    Status { status: u16, message: String },

    /// Upstream answered with a body that could not be decoded.
    #[error("invalid upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Any other collaborator failure.
    #[error("{0}")]
    Other(String),
}

/// UXO record source.
#[async_trait]
pub trait UxoService: Send + Sync + 'static {
    /// All records in their display form. May be empty.
    async fn uxos_for_display(&self) -> Result<Vec<UxoMapItem>, ServiceError>;

    /// One full record, or `None` if no record has this id.
    async fn fetch_uxo(&self, id: &str) -> Result<Option<Uxo>, ServiceError>;
}

/// Document generator for a single record.
#[async_trait]
pub trait UxoDocumentService: Send + Sync + 'static {
    /// Render `uxo` as a document. `None` or an empty payload means nothing
    /// was produced.
    async fn create_document(&self, uxo: &Uxo) -> Result<Option<Vec<u8>>, ServiceError>;
}
