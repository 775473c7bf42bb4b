//! UXO routes: `/recons/uxo/uxo/*`
//!
//! Collaborator failures are logged with their detail and answered with a
//! generic message. Not-found answers name the requested id.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::models::{Uxo, UxoMapItem};
use crate::state::AppState;

const LIST_FAILED: &str = "Error retrieving data";
const DOCUMENT_FAILED: &str = "Unable to generate the document.";

/// Content type of generated documents. The casing is part of the contract.
pub const DOCUMENT_CONTENT_TYPE: &str = "APPLICATION/octet-stream";

/// Build the UXO router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_uxos))
        .route("/{id}/details", get(get_uxo))
        .route("/{id}/documents/create", post(generate_document))
}

fn item_error(id: &str) -> String {
    format!("Unable to retrieve item '{id}'")
}

/// Attachment name for a document generated at `now`.
#[must_use]
pub fn document_filename(now: DateTime<Utc>) -> String {
    format!("UXO-{}.docx", now.format("%Y-%m-%dT%H:%MZ"))
}

/// List all records in display form.
async fn list_uxos(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UxoMapItem>>, AppError> {
    match state.uxos.uxos_for_display().await {
        Ok(items) => Ok(Json(items)),
        Err(err) => {
            error!(error = %err, "failed to list UXO records");
            Err(AppError::Internal(LIST_FAILED.to_owned()))
        }
    }
}

/// Fetch one record.
async fn get_uxo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Uxo>, AppError> {
    lookup(&state, &id).await.map(Json)
}

/// Generate a document for one record and return it as an attachment.
async fn generate_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let uxo = lookup(&state, &id).await?;

    let bytes = match state.documents.create_document(&uxo).await {
        Ok(Some(bytes)) if !bytes.is_empty() => bytes,
        Ok(_) => {
            warn!(id = %id, "document service produced no content");
            return Err(AppError::Internal(DOCUMENT_FAILED.to_owned()));
        }
        Err(err) => {
            error!(id = %id, error = %err, "document generation failed");
            return Err(AppError::Internal(DOCUMENT_FAILED.to_owned()));
        }
    };

    let filename = document_filename(Utc::now());
    info!(id = %id, filename = %filename, size = bytes.len(), "generated UXO document");

    Ok((
        [
            (CONTENT_TYPE, DOCUMENT_CONTENT_TYPE.to_owned()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response())
}

async fn lookup(state: &AppState, id: &str) -> Result<Uxo, AppError> {
    match state.uxos.fetch_uxo(id).await {
        Ok(Some(uxo)) => Ok(uxo),
        Ok(None) => {
            warn!(id = %id, "UXO record not found");
            Err(AppError::NotFound(item_error(id)))
        }
        Err(err) => {
            error!(id = %id, error = %err, "failed to fetch UXO record");
            Err(AppError::Internal(item_error(id)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn filename_uses_utc_minutes() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 59).unwrap();
        assert_eq!(document_filename(at), "UXO-2024-03-07T09:05Z.docx");
    }

    #[test]
    fn item_error_names_the_id() {
        assert_eq!(item_error("abc"), "Unable to retrieve item 'abc'");
    }
}
