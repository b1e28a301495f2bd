use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised by a table's cell function.
pub type CellError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Validation failed: {message}")]
    #[diagnostic(
        code(sysprop_core::validation_failed),
        help("Check the field errors for specific validation issues")
    )]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("Computation failed in table '{table}' at row ({row}), column ({col})")]
    #[diagnostic(
        code(sysprop_core::computation_failed),
        help("The cell function must succeed for every declared row and column key")
    )]
    Computation {
        table: String,
        row: String,
        col: String,
        #[source]
        cause: CellError,
    },

    #[error("A handler for MIME-type {mimetype} already exists")]
    #[diagnostic(
        code(sysprop_core::duplicate_format),
        help("Each MIME-type can only be registered once")
    )]
    DuplicateFormat { mimetype: String },

    #[error("Duplicate table name: {name}")]
    #[diagnostic(
        code(sysprop_core::duplicate_table_name),
        help("Table names double as file and sheet names and must be unique within a result")
    )]
    DuplicateTableName { name: String },

    #[error("Unknown MIME-type {mimetype}")]
    #[diagnostic(
        code(sysprop_core::unknown_format),
        help("Available formats: {}", available.join(", "))
    )]
    UnknownFormat {
        mimetype: String,
        available: Vec<String>,
    },

    #[error("Invalid table '{table}': {reason}")]
    #[diagnostic(code(sysprop_core::invalid_table))]
    InvalidTable { table: String, reason: String },

    #[error("Key ({key}) is not on the {axis} of table '{table}'")]
    #[diagnostic(code(sysprop_core::key_not_found))]
    KeyNotFound {
        table: String,
        axis: &'static str,
        key: String,
    },

    #[error("Tool not found: {tool_name}")]
    #[diagnostic(
        code(sysprop_core::tool_not_found),
        help("Available tools: {}", available_tools.join(", "))
    )]
    ToolNotFound {
        tool_name: String,
        available_tools: Vec<String>,
    },

    #[error("Rendering {format} output failed")]
    #[diagnostic(code(sysprop_core::render_failed))]
    Render {
        format: &'static str,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Configuration error in {config_path}")]
    #[diagnostic(
        code(sysprop_core::configuration_error),
        help("Field '{field}' should be {expected}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },
}

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl CoreError {
    /// Create a validation error from a set of field errors
    pub fn validation(fields: Vec<FieldError>) -> Self {
        let message = fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation { message, fields }
    }

    pub fn invalid_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            table: table.into(),
            reason: reason.into(),
        }
    }

    pub fn tool_not_found(tool_name: impl Into<String>, available_tools: Vec<String>) -> Self {
        Self::ToolNotFound {
            tool_name: tool_name.into(),
            available_tools,
        }
    }

    pub(crate) fn render<E>(format: &'static str, cause: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Render {
            format,
            cause: cause.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
