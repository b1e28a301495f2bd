//! Tools bundled with the server

use std::sync::Arc;

use sysprop_core::ToolRegistry;

pub mod demo;

/// Registry holding every bundled tool
pub fn builtin() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(demo::DemoTool::new()));
    registry
}
