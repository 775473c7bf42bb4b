//! HTTP-backed UXO data and document service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{ServiceError, UxoDocumentService, UxoService};
use crate::models::{Uxo, UxoMapItem};

const API_KEY_HEADER: &str = "x-api-key";

/// Client for the upstream UXO service.
///
/// - `GET {base}/uxos` lists display records.
/// - `GET {base}/uxos/{id}` fetches one record; `404` means absent.
/// - `POST {base}/uxos/{id}/documents` renders a record, answering raw bytes.
#[derive(Clone)]
pub struct UpstreamUxoService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for UpstreamUxoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamUxoService")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    message: Option<String>,
}

impl UpstreamUxoService {
    /// Create a client for the upstream at `base_url`.
    ///
    /// An empty `api_key` is treated as no key.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Request`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        api_key: Option<String>,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ignite-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn uxo_url(&self, id: &str) -> String {
        format!("{}/uxos/{}", self.base_url, urlencoding::encode(id))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key),
            None => req,
        }
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<UpstreamErrorBody>(&text)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Err(ServiceError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl UxoService for UpstreamUxoService {
    async fn uxos_for_display(&self) -> Result<Vec<UxoMapItem>, ServiceError> {
        let url = format!("{}/uxos", self.base_url);
        let resp = self.authorize(self.client.get(&url)).send().await?;
        let text = ensure_success(resp).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn fetch_uxo(&self, id: &str) -> Result<Option<Uxo>, ServiceError> {
        let resp = self.authorize(self.client.get(self.uxo_url(id))).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(id, "upstream has no such record");
            return Ok(None);
        }
        let text = ensure_success(resp).await?.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[async_trait]
impl UxoDocumentService for UpstreamUxoService {
    async fn create_document(&self, uxo: &Uxo) -> Result<Option<Vec<u8>>, ServiceError> {
        let url = format!("{}/documents", self.uxo_url(&uxo.id));
        let resp = self
            .authorize(self.client.post(&url).json(uxo))
            .send()
            .await?;
        let bytes = ensure_success(resp).await?.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes.to_vec()))
    }
}
