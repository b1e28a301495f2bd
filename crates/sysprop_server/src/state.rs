//! Application state

use std::sync::Arc;

use sysprop_core::{FormatRegistry, ToolRegistry};

use crate::{config::ServerConfig, error::ServerResult, tools};

/// Shared by every request. Both registries are built at startup and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub formats: Arc<FormatRegistry>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    /// State with the standard formats and the bundled tools
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Self::with_tools(config, tools::builtin())
    }

    pub fn with_tools(config: ServerConfig, tools: ToolRegistry) -> ServerResult<Self> {
        let formats = FormatRegistry::standard(&config.download_stem)?;
        Ok(Self {
            config: Arc::new(config),
            formats: Arc::new(formats),
            tools: Arc::new(tools),
        })
    }
}
