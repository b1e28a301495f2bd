//! Sysprop client
//!
//! A blocking client that learns a server's operations at runtime and calls
//! them with JSON arguments, decoding tabular results back into typed keys.

pub mod client;
pub mod error;
pub mod result;

pub use client::{Client, DEFAULT_URL};
pub use error::{ClientError, Result};
pub use result::{CallOutput, RemoteResult, RemoteTable, TypedKey};
