//! Discovery and form schema documents

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sysprop_core::tool::{ParamSpec, Tool};

/// One entry of the discovery document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    /// Where to POST arguments, relative to the base URL or absolute
    pub url: String,
    /// Parameter names in positional order
    pub params: Vec<String>,
    pub doc: String,
    #[serde(default)]
    pub title: String,
}

impl OperationInfo {
    pub fn for_tool(tool: &dyn Tool, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: tool.params().iter().map(|p| p.name.clone()).collect(),
            doc: tool.doc().to_string(),
            title: tool.title().to_string(),
        }
    }
}

/// `GET /api`: operation name to its description
pub type ApiSchema = BTreeMap<String, OperationInfo>;

/// An output format a caller may choose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOption {
    pub mimetype: String,
    pub label: String,
}

/// `GET /tool/{name}`: what is needed to build an input form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolForm {
    pub name: String,
    pub title: String,
    pub doc: String,
    pub fields: Vec<ParamSpec>,
    pub formats: Vec<FormatOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
