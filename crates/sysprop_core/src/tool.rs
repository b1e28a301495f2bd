use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::result::ToolResult;

pub mod params;

pub use params::{ArgValue, Args, Constraints, ParamKind, ParamSpec};

/// A calculation exposed through the form and RPC endpoints
pub trait Tool: Send + Sync + Debug {
    /// Machine name, used in URLs
    fn name(&self) -> &str;

    /// One-line summary
    fn title(&self) -> &str;

    /// Longer description of what the tool computes
    fn doc(&self) -> &str;

    /// Parameters in display order
    fn params(&self) -> &[ParamSpec];

    /// Compute a result from validated arguments
    fn run(&self, args: &Args) -> Result<ToolResult>;

    /// Validate a JSON object of named arguments
    fn parse_json(&self, value: &Value) -> Result<Args> {
        params::parse_json(self.params(), value)
    }

    /// Validate submitted form fields
    fn parse_form(&self, fields: &[(String, String)]) -> Result<Args> {
        params::parse_form(self.params(), fields)
    }

    fn param_names(&self) -> Vec<&str> {
        self.params().iter().map(|p| p.name.as_str()).collect()
    }
}

/// A registry for managing available tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool already registered under its name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "replaced previously registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Like [`ToolRegistry::get`], failing with [`CoreError::ToolNotFound`]
    pub fn require(&self, name: &str) -> Result<&Arc<dyn Tool>> {
        self.get(name)
            .ok_or_else(|| CoreError::tool_not_found(name, self.list_tools()))
    }

    /// Tool names in sorted order
    pub fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate JSON arguments and run a tool by name
    pub fn execute(&self, tool_name: &str, params: &Value) -> Result<ToolResult> {
        let tool = self.require(tool_name)?;
        let args = tool.parse_json(params)?;
        debug!(tool = tool_name, ?args, "running tool");
        tool.run(&args)
    }
}
