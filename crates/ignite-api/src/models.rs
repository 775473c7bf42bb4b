//! Wire types for the UXO endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Display-oriented UXO record used by list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UxoMapItem {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Map symbol code, e.g. a MIL-STD-2525C symbol identifier.
    pub symbol: String,
}

/// Full UXO record.
///
/// Only the identifier is interpreted here. Every other field passes
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uxo {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Uxo {
    /// A record with an identifier and no other fields.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }
}

/// JSON error body returned by every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
}
