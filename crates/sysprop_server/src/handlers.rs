//! HTTP request handlers

use axum::{
    Router,
    http::{HeaderMap, header},
    routing::{get, post},
};
use sysprop_api::ApiError;
use sysprop_core::CoreError;
use tracing::{error, warn};

pub mod api;
pub mod health;
pub mod tool;

use crate::state::AppState;

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // RPC discovery and calls
        .route("/api", get(api::discovery))
        .route("/api/:name", post(api::call))
        // Form schema and submissions
        .route("/tool/:name", get(tool::form_schema).post(tool::submit))
}

/// The request's `Accept` header, empty when absent
pub(crate) fn accept_header(headers: &HeaderMap) -> &str {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Log a failed request and convert the error for the response
pub(crate) fn reject(tool: &str, err: CoreError) -> ApiError {
    match &err {
        CoreError::Computation { .. } | CoreError::Render { .. } => {
            error!(tool, error = %err, "tool failed")
        }
        _ => warn!(tool, error = %err, "request rejected"),
    }
    ApiError::from(err)
}

/// Run a tool's computation off the async workers
pub(crate) async fn run_blocking<T, F>(tool: &str, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> sysprop_core::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(reject(tool, err)),
        Err(join) => {
            error!(tool, error = %join, "tool task did not complete");
            Err(ApiError::Core {
                message: format!("tool '{tool}' did not complete"),
                json: String::new(),
            })
        }
    }
}
