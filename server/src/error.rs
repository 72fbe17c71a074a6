//! Store errors and their HTTP mapping.
//!
//! Every variant's `Display` is the exact message sent to the client in the
//! `{"errorMessage": ...}` envelope.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another todo already uses this title.
    #[error("Error: TODO with the title [{0}] already exists in the system")]
    DuplicateTitle(String),

    /// The requested due date is earlier than the time of the request.
    #[error("Error: Can't create new TODO that its due date is in the past")]
    DueDateInPast,

    /// No todo carries the given id. Holds the id exactly as the client sent it.
    #[error("Error: no such TODO with id {0}")]
    NotFound(String),

    /// An enumeration parameter or the request body could not be understood.
    #[error("bad request")]
    BadRequest,
}

impl StoreError {
    pub fn not_found(id: impl ToString) -> Self {
        StoreError::NotFound(id.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::DuplicateTitle(_) | StoreError::DueDateInPast => StatusCode::CONFLICT,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::BadRequest => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for StoreError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "rejected request body");
        StoreError::BadRequest
    }
}

impl From<QueryRejection> for StoreError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(%rejection, "rejected query string");
        StoreError::BadRequest
    }
}

/// JSON body for every non-2xx response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(status = status.as_u16(), error = %self, "request failed");
        let body = ErrorBody {
            error_message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
