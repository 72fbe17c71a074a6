//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ApiResult, CreateTodo, ErrorBody, SortKey, Status, StatusFilter, Todo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/todo{path}", self.base_url)
    }

    pub fn build_health(&self) -> HttpRequest {
        HttpRequest::bare(HttpMethod::Get, self.url("/health"))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::json(HttpMethod::Post, self.url(""), body))
    }

    pub fn build_count(&self, filter: StatusFilter) -> HttpRequest {
        HttpRequest::bare(
            HttpMethod::Get,
            self.url(&format!("/size?status={}", filter.as_str())),
        )
    }

    /// `sort` of `None` leaves ordering to the server default (by id).
    pub fn build_list(&self, filter: StatusFilter, sort: Option<SortKey>) -> HttpRequest {
        let mut path = format!("/content?status={}", filter.as_str());
        if let Some(sort) = sort {
            path.push_str("&sortBy=");
            path.push_str(sort.as_str());
        }
        HttpRequest::bare(HttpMethod::Get, self.url(&path))
    }

    pub fn build_update_status(&self, id: u64, status: Status) -> HttpRequest {
        HttpRequest::bare(
            HttpMethod::Put,
            self.url(&format!("?id={id}&status={}", status.as_str())),
        )
    }

    pub fn build_delete_todo(&self, id: u64) -> HttpRequest {
        HttpRequest::bare(HttpMethod::Delete, self.url(&format!("?id={id}")))
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// Returns the id assigned to the new todo.
    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<u64, ApiError> {
        parse_result(response)
    }

    pub fn parse_count(&self, response: HttpResponse) -> Result<usize, ApiError> {
        parse_result(response)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_result(response)
    }

    /// Returns the status the todo held before the update.
    pub fn parse_update_status(&self, response: HttpResponse) -> Result<Status, ApiError> {
        parse_result(response)
    }

    /// Returns how many todos remain after the delete.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<usize, ApiError> {
        parse_result(response)
    }
}

fn parse_result<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str::<ApiResult<T>>(&response.body)
        .map(|envelope| envelope.result)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-200 status codes to the matching `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    let message = || {
        serde_json::from_str::<ErrorBody>(&response.body)
            .map(|body| body.error_message)
            .unwrap_or_else(|_| response.body.clone())
    };
    match response.status {
        200 => Ok(()),
        400 => Err(ApiError::BadRequest(message())),
        404 => Err(ApiError::NotFound(message())),
        409 => Err(ApiError::Conflict(message())),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
