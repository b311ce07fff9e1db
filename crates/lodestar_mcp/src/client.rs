//! The remote tool-provider seam.
//!
//! Lodestar does not speak the MCP wire protocol itself. A transport crate
//! (or a test) supplies a [`Connector`] that opens connections and an
//! [`McpClient`] per connection that lists and calls tools.

use crate::error::ConnectionError;
use crate::session::ConnectionParams;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A tool as advertised by a provider's tool listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    #[serde(default)]
    pub description: String,
    /// JSON schema of the tool's arguments.
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl RemoteTool {
    /// Creates a tool entry with an empty argument schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_object_schema(),
        }
    }
}

/// An established connection to one provider.
#[async_trait]
pub trait McpClient: Send + Sync + 'static {
    /// Lists every tool the provider offers.
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, ConnectionError>;

    /// Calls a tool by name.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ConnectionError>;
}

/// Opens connections to providers.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connects using fully resolved parameters.
    ///
    /// Errors are returned to the caller unchanged; no retries are attempted.
    async fn connect(&self, params: &ConnectionParams)
    -> Result<Arc<dyn McpClient>, ConnectionError>;
}
