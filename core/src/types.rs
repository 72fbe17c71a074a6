//! Domain DTOs for the todo API, defined independently of the server crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Done,
    Late,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Done => "DONE",
            Status::Late => "LATE",
        }
    }
}

/// Value of the `status` query parameter on count and list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Pending,
    Done,
    Late,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Pending => "PENDING",
            StatusFilter::Done => "DONE",
            StatusFilter::Late => "LATE",
        }
    }
}

impl From<Status> for StatusFilter {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => StatusFilter::Pending,
            Status::Done => StatusFilter::Done,
            Status::Late => StatusFilter::Late,
        }
    }
}

/// Value of the `sortBy` query parameter. The server defaults to `Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    DueDate,
    Title,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "ID",
            SortKey::DueDate => "DUE_DATE",
            SortKey::Title => "TITLE",
        }
    }
}

/// A single todo item returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub status: Status,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
}

/// `{"result": ...}` envelope wrapping every successful response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResult<T> {
    pub result: T,
}

/// `{"errorMessage": ...}` envelope on failures.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    pub error_message: String,
}
