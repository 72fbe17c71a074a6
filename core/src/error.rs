//! Error types for the todo API client.
//!
//! The three failure kinds the service reports (unknown id, conflict, bad
//! request) each get a variant carrying the server's `errorMessage`. Any
//! other unexpected status lands in `HttpError` with the raw body.

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 404: no todo with the requested id.
    #[error("not found: {0}")]
    NotFound(String),

    /// 409: duplicate title or a due date in the past.
    #[error("conflict: {0}")]
    Conflict(String),

    /// 400: an unknown status, sort key or malformed payload.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any other status that is not the expected one.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),
}
