//! Server error types

use axum::response::{IntoResponse, Response};
use sysprop_api::ApiError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ServerError {
    #[error("Core error: {0}")]
    #[diagnostic(transparent)]
    Core(#[from] sysprop_core::error::CoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Convert to ApiError for consistent error responses
        let api_error = match self {
            ServerError::Core(e) => ApiError::from(e),
            ServerError::Api(e) => e,
            other => ApiError::Core {
                message: other.to_string(),
                json: String::new(),
            },
        };

        api_error.into_response()
    }
}
