//! In-memory TODO tracking service.
//!
//! # Overview
//! [`TodoStore`] owns every todo and enforces the consistency rules (unique
//! titles, future due dates, monotonic ids). The handlers in [`handlers`] map
//! six HTTP endpoints onto it one to one:
//!
//! | Method & path        | Operation               |
//! |----------------------|-------------------------|
//! | `GET /todo/health`   | liveness                |
//! | `POST /todo`         | create                  |
//! | `GET /todo/size`     | count by status         |
//! | `GET /todo/content`  | filtered, sorted list   |
//! | `PUT /todo`          | update status           |
//! | `DELETE /todo`       | delete                  |

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod mirror;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use mirror::{MirrorError, MirrorEvent, TodoMirror};
pub use store::TodoStore;
pub use types::{NewTodo, SortKey, Status, StatusFilter, Todo};

/// Router over a fresh, empty store.
pub fn app() -> Router {
    router(Arc::new(TodoStore::new()))
}

pub fn router(store: Arc<TodoStore>) -> Router {
    Router::new()
        .route("/todo/health", get(handlers::health))
        .route(
            "/todo",
            post(handlers::create_todo)
                .put(handlers::update_status)
                .delete(handlers::delete_todo),
        )
        .route("/todo/size", get(handlers::count_todos))
        .route("/todo/content", get(handlers::list_todos))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Serves [`app`] on `listener` until Ctrl-C.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => {
            tracing::error!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}
