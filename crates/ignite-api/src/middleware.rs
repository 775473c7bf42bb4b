//! Bearer token authentication.
//!
//! Accepted tokens are configured as SHA-256 hex digests; the presented
//! token is hashed and looked up. Tokens are never stored or logged in
//! plaintext.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Hash a token with SHA-256, hex encoded.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Axum middleware that rejects requests without an accepted bearer token.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] if the `Authorization` header is
/// missing, not a bearer token, or carries an unknown token.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header) = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Err(AppError::Unauthorized(
            "missing Authorization header".to_owned(),
        ));
    };

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use Bearer scheme".to_owned())
        })?;

    if !state.token_hashes.contains(&hash_token(token)) {
        debug!(path = %req.uri().path(), "rejected unknown bearer token");
        return Err(AppError::Unauthorized("invalid token".to_owned()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
