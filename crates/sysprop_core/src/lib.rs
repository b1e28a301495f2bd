//! Sysprop Core - result tables and their output formats
//!
//! Tools produce a [`ToolResult`]: an ordered set of multi-dimensional
//! [`Table`]s. A [`FormatRegistry`] maps MIME types to the built-in encoders
//! (JSON, XML, zipped CSV, Excel and HTML) which turn a result into bytes
//! plus response headers.

pub mod error;
pub mod format;
pub mod key;
pub mod render;
pub mod result;
pub mod table;
pub mod tool;

pub use error::{CoreError, FieldError, Result};
pub use format::{Format, FormatEntry, FormatRegistry, Rendered};
pub use key::{AxisKey, CanonicalKey, Key, Scalar};
pub use result::ToolResult;
pub use table::{Axis, AxisTitles, Table, TableBuilder};
pub use tool::{ArgValue, Args, ParamKind, ParamSpec, Tool, ToolRegistry};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        ArgValue, Args, Axis, AxisKey, CanonicalKey, CoreError, FieldError, FormatRegistry, Key,
        ParamKind, ParamSpec, Result, Scalar, Table, Tool, ToolRegistry, ToolResult,
    };
}
