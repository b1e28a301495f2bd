//! Client error types

use miette::Diagnostic;
use serde_json::Value;
use sysprop_api::FieldError;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ClientError {
    #[error("Invalid URL '{url}': {message}")]
    #[diagnostic(
        code(sysprop_client::invalid_url),
        help("Use an absolute http:// or https:// URL")
    )]
    InvalidUrl { url: String, message: String },

    #[error("Request failed: {0}")]
    #[diagnostic(
        code(sysprop_client::transport),
        help("Check that the server is running and reachable")
    )]
    Transport(#[from] reqwest::Error),

    /// The discovery endpoint answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    #[diagnostic(
        code(sysprop_client::status),
        help("The base URL must point at a sysprop server")
    )]
    Status { url: String, status: u16, body: String },

    #[error("ValueError: {}", describe(.value))]
    #[diagnostic(code(sysprop_client::value_error))]
    Value { value: Value, fields: Vec<FieldError> },

    #[error("NameError: {}", describe(.value))]
    #[diagnostic(code(sysprop_client::name_error))]
    Name { value: Value },

    #[error("KeyError: {}", describe(.value))]
    #[diagnostic(code(sysprop_client::key_error))]
    Key { value: Value },

    /// The server's response does not have the agreed shape
    #[error("Protocol error: {message}")]
    #[diagnostic(
        code(sysprop_client::protocol),
        help("Client and server may disagree on the API version")
    )]
    Protocol { message: String },

    #[error("Server error (HTTP {status}): {body}")]
    #[diagnostic(code(sysprop_client::server))]
    Server { status: u16, body: String },

    #[error("Unknown operation: {name}")]
    #[diagnostic(
        code(sysprop_client::unknown_operation),
        help("Available operations: {}", available.join(", "))
    )]
    UnknownOperation { name: String, available: Vec<String> },

    #[error("Bad arguments for {operation}: {message}")]
    #[diagnostic(
        code(sysprop_client::signature),
        help("Expected parameters: {}", params.join(", "))
    )]
    Signature {
        operation: String,
        message: String,
        params: Vec<String>,
    },
}

/// Error values are usually a message; anything else is shown as JSON
fn describe(value: &Value) -> String {
    match value {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

impl ClientError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}
