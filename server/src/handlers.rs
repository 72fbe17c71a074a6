//! HTTP handlers. Each one parses its parameters, calls the store once and
//! wraps the outcome in a `{"result": ...}` body.
//!
//! Query parameters are taken as raw strings so that a missing or unknown
//! value becomes a `StoreError` rather than an extractor rejection.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::TodoStore;
use crate::types::{NewTodo, SortKey, Status, StatusFilter, Todo};

pub type SharedStore = Arc<TodoStore>;

/// Success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResult<T> {
    pub result: T,
}

impl<T> ApiResult<T> {
    fn json(result: T) -> Json<Self> {
        Json(Self { result })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    pub status: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TodoQuery {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// Positive integer ids only. Anything else cannot name a stored todo.
fn parse_id(raw: Option<&str>) -> Result<u64, StoreError> {
    let raw = raw.unwrap_or_default();
    raw.parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| StoreError::not_found(raw))
}

fn parse_filter(raw: Option<&str>) -> Result<StatusFilter, StoreError> {
    raw.unwrap_or_default().parse()
}

#[tracing::instrument]
pub async fn health() -> &'static str {
    "OK"
}

#[tracing::instrument(skip_all)]
pub async fn create_todo(
    State(store): State<SharedStore>,
    payload: Result<Json<NewTodo>, JsonRejection>,
) -> Result<Json<ApiResult<u64>>, StoreError> {
    let Json(new) = payload?;
    let id = store.create(new).await?;
    tracing::info!(id, "created todo");
    Ok(ApiResult::json(id))
}

#[tracing::instrument(skip_all)]
pub async fn count_todos(
    State(store): State<SharedStore>,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Result<Json<ApiResult<usize>>, StoreError> {
    let Query(query) = query?;
    let filter = parse_filter(query.status.as_deref())?;
    Ok(ApiResult::json(store.count(filter).await))
}

#[tracing::instrument(skip_all)]
pub async fn list_todos(
    State(store): State<SharedStore>,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Result<Json<ApiResult<Vec<Todo>>>, StoreError> {
    let Query(query) = query?;
    let filter = parse_filter(query.status.as_deref())?;
    let sort = query
        .sort_by
        .as_deref()
        .map(str::parse::<SortKey>)
        .transpose()?
        .unwrap_or_default();
    Ok(ApiResult::json(store.list(filter, sort).await))
}

/// An unknown id is reported before an invalid status.
#[tracing::instrument(skip_all)]
pub async fn update_status(
    State(store): State<SharedStore>,
    query: Result<Query<TodoQuery>, QueryRejection>,
) -> Result<Json<ApiResult<Status>>, StoreError> {
    let Query(query) = query?;
    let id = parse_id(query.id.as_deref())?;
    let status = match query.status.as_deref().unwrap_or_default().parse::<Status>() {
        Ok(status) => status,
        Err(err) => {
            if store.contains(id).await {
                return Err(err);
            }
            return Err(StoreError::not_found(id));
        }
    };
    let previous = store.update_status(id, status).await?;
    tracing::info!(id, %previous, %status, "updated todo status");
    Ok(ApiResult::json(previous))
}

#[tracing::instrument(skip_all)]
pub async fn delete_todo(
    State(store): State<SharedStore>,
    query: Result<Query<TodoQuery>, QueryRejection>,
) -> Result<Json<ApiResult<usize>>, StoreError> {
    let Query(query) = query?;
    let id = parse_id(query.id.as_deref())?;
    let remaining = store.delete(id).await?;
    tracing::info!(id, remaining, "deleted todo");
    Ok(ApiResult::json(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_positive_integers() {
        assert_eq!(parse_id(Some("1")).unwrap(), 1);
        assert_eq!(parse_id(Some("0042")).unwrap(), 42);
    }

    #[test]
    fn parse_id_reports_raw_value_as_not_found() {
        for raw in ["0", "-3", "abc", "1.5", ""] {
            let err = parse_id(Some(raw)).unwrap_err();
            assert_eq!(err.to_string(), format!("Error: no such TODO with id {raw}"));
        }
        assert!(matches!(parse_id(None), Err(StoreError::NotFound(ref id)) if id.is_empty()));
    }

    #[test]
    fn missing_filter_is_bad_request() {
        assert!(matches!(parse_filter(None), Err(StoreError::BadRequest)));
        assert_eq!(parse_filter(Some("ALL")).unwrap(), StatusFilter::All);
    }

    #[test]
    fn content_query_reads_sort_by_in_camel_case() {
        let query: ContentQuery =
            serde_json::from_str(r#"{"status":"DONE","sortBy":"TITLE"}"#).unwrap();
        assert_eq!(query.status.as_deref(), Some("DONE"));
        assert_eq!(query.sort_by.as_deref(), Some("TITLE"));
    }
}
