//! HTTP response envelope contract.
//!
//! Transport itself is out of scope (spec.md §1 keeps "HTTP surface"
//! contract-only); this module only fixes the shape every handler serializes
//! into, so the HTTP layer — wherever it is eventually wired up — has a
//! single, typed envelope to target.

use serde::{Deserialize, Serialize};

/// A successful API response: `{data, meta}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The response payload.
    pub data: T,
    /// Request-scoped metadata.
    pub meta: Meta,
}

impl<T> Envelope<T> {
    /// Wrap a payload with a trace id and no pagination.
    pub fn new(data: T, trace_id: impl Into<String>) -> Self {
        Self {
            data,
            meta: Meta {
                trace_id: trace_id.into(),
                pagination: None,
            },
        }
    }
}

/// Metadata attached to every successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Correlates this response with server-side logs/traces.
    pub trace_id: String,
    /// Present on paginated list endpoints.
    pub pagination: Option<Pagination>,
}

/// Offset-based pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Number of items per page.
    pub limit: u32,
    /// Offset of the first item in this page.
    pub offset: u32,
}

/// A failed API response: `{error}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error payload.
    pub error: ErrorBody,
}

/// The body of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error category.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Field-level validation failures, present for `ValidationError`.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    /// Correlates this error with server-side logs/traces.
    pub trace_id: String,
}

/// Machine-readable API error categories (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request body or parameters failed validation.
    ValidationError,
    /// An unhandled internal failure occurred.
    InternalServerError,
    /// The referenced resource does not exist.
    NotFound,
    /// The caller is not authorized for this action.
    Unauthorized,
}
