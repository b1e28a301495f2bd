//! API error types
//!
//! Client errors (4xx) are sent as an [`ErrorBody`] naming one of the
//! allow-listed [`ExcType`]s. Server errors (5xx) carry an opaque diagnostic
//! body that clients report verbatim.

use miette::{Diagnostic, JSONReportHandler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sysprop_core::error::{CoreError, FieldError};

/// Kinds of client error a remote call may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcType {
    ValueError,
    NameError,
    KeyError,
}

impl ExcType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExcType::ValueError => "ValueError",
            ExcType::NameError => "NameError",
            ExcType::KeyError => "KeyError",
        }
    }

    /// `None` for anything outside the allow-list
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ValueError" => Some(ExcType::ValueError),
            "NameError" => Some(ExcType::NameError),
            "KeyError" => Some(ExcType::KeyError),
            _ => None,
        }
    }
}

/// Body of a 4xx response. `exc_type` stays a plain string so that a
/// receiver can tell an unknown kind apart from a malformed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub exc_type: String,
    /// A message, or a list of values
    pub exc_value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// API error response
#[derive(Debug, thiserror::Error, Diagnostic, Serialize, Deserialize)]
pub enum ApiError {
    /// Arguments failed validation
    #[error("Validation failed: {message}")]
    #[diagnostic(
        code(api::validation_error),
        help("Check the field errors for specific validation issues")
    )]
    ValidationError {
        message: String,
        fields: Vec<FieldError>,
    },

    /// No tool registered under the requested name
    #[error("Unknown operation: {name}")]
    #[diagnostic(
        code(api::unknown_operation),
        help("Available operations: {}", available.join(", "))
    )]
    UnknownOperation { name: String, available: Vec<String> },

    /// None of the registered formats satisfies the request
    #[error("Cannot produce {requested}")]
    #[diagnostic(
        code(api::not_acceptable),
        help("Available formats: {}", available.join(", "))
    )]
    NotAcceptable {
        requested: String,
        available: Vec<String>,
    },

    /// JSON error
    #[error("{message}")]
    #[diagnostic(
        code(api::json_error),
        help("Check that your JSON is valid and matches the expected schema")
    )]
    Json { message: String },

    /// Form body could not be decoded
    #[error("{message}")]
    #[diagnostic(code(api::form_error))]
    Form { message: String },

    #[error("Request body exceeds the limit of {limit} bytes")]
    #[diagnostic(
        code(api::payload_too_large),
        help("Split the request into smaller calls")
    )]
    PayloadTooLarge { limit: usize },

    /// A table cell could not be computed
    #[error("{message}")]
    #[diagnostic(code(api::computation_error), help("The tool failed while computing its result"))]
    Computation { message: String, json: String },

    /// Core error from sysprop-core
    #[error("{message}")]
    #[diagnostic(code(api::core_error), help("Core operation failed"))]
    Core { message: String, json: String },
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 422,
            ApiError::UnknownOperation { .. } => 404,
            ApiError::NotAcceptable { .. } => 406,
            ApiError::Json { .. } => 400,
            ApiError::Form { .. } => 400,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Computation { .. } => 500,
            ApiError::Core { .. } => 500,
        }
    }

    /// The client error kind, `None` for server errors
    pub fn exc_type(&self) -> Option<ExcType> {
        match self {
            ApiError::ValidationError { .. }
            | ApiError::Json { .. }
            | ApiError::Form { .. }
            | ApiError::PayloadTooLarge { .. } => Some(ExcType::ValueError),
            ApiError::UnknownOperation { .. } => Some(ExcType::NameError),
            ApiError::NotAcceptable { .. } => Some(ExcType::KeyError),
            ApiError::Computation { .. } | ApiError::Core { .. } => None,
        }
    }

    /// The 4xx body for client errors
    pub fn error_body(&self) -> Option<ErrorBody> {
        let exc_type = self.exc_type()?;
        let (exc_value, fields) = match self {
            ApiError::ValidationError { message, fields } => {
                (Value::String(message.clone()), fields.clone())
            }
            ApiError::UnknownOperation { name, .. } => (Value::String(name.clone()), Vec::new()),
            ApiError::NotAcceptable { requested, .. } => {
                (Value::String(requested.clone()), Vec::new())
            }
            other => (Value::String(other.to_string()), Vec::new()),
        };
        Some(ErrorBody {
            exc_type: exc_type.as_str().to_string(),
            exc_value,
            fields,
        })
    }

    pub fn unknown_operation(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::UnknownOperation {
            name: name.into(),
            available,
        }
    }

    pub fn not_acceptable(requested: impl Into<String>, available: Vec<String>) -> Self {
        Self::NotAcceptable {
            requested: requested.into(),
            available,
        }
    }

    pub fn form(message: impl Into<String>) -> Self {
        Self::Form {
            message: message.into(),
        }
    }
}

fn json_report(err: CoreError) -> (String, String) {
    let handler = JSONReportHandler::new();

    let message = format!("{}", err);
    let mut json = String::new();

    let err: Box<dyn Diagnostic> = Box::new(err);
    handler
        .render_report(&mut json, err.as_ref())
        .unwrap_or_default();
    (message, json)
}

// Conversion implementations
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message, fields } => Self::ValidationError { message, fields },
            CoreError::ToolNotFound {
                tool_name,
                available_tools,
            } => Self::unknown_operation(tool_name, available_tools),
            CoreError::UnknownFormat {
                mimetype,
                available,
            } => Self::not_acceptable(mimetype, available),
            err @ CoreError::Computation { .. } => {
                let (message, json) = json_report(err);
                Self::Computation { message, json }
            }
            err => {
                let (message, json) = json_report(err);
                Self::Core { message, json }
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

// Server-side response conversion
#[cfg(feature = "server")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let Some(body) = self.error_body() {
            return (status, Json(body)).into_response();
        }

        let error_type = match &self {
            ApiError::Computation { .. } => "computation_error",
            _ => "core_error",
        };
        let mut error_obj = serde_json::json!({
            "type": error_type,
            "message": self.to_string(),
        });
        if let ApiError::Computation { json, .. } | ApiError::Core { json, .. } = &self {
            if let Ok(detail) = serde_json::from_str::<Value>(json) {
                error_obj["detail"] = detail;
            }
        }

        let body = serde_json::json!({
            "error": error_obj,
            "timestamp": chrono::Utc::now(),
        });

        (status, Json(body)).into_response()
    }
}
