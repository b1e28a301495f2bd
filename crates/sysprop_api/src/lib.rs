//! Sysprop API types
//!
//! This crate defines the discovery schema, the RPC result payload and the
//! error bodies exchanged between the sysprop server and its clients.

pub mod error;
pub mod payload;
pub mod schema;

pub use error::{ApiError, ErrorBody, ExcType};
pub use payload::{KeyType, ResultPayload, TableInfo};
pub use schema::{ApiSchema, FormatOption, HealthResponse, OperationInfo, ToolForm};

// Re-export common types from sysprop-core
pub use sysprop_core::error::FieldError;
pub use sysprop_core::tool::{ParamKind, ParamSpec};

/// API version constant
pub const API_VERSION: &str = "v1";

/// Path of the discovery endpoint, relative to the base URL
pub const DISCOVERY_PATH: &str = "api";
