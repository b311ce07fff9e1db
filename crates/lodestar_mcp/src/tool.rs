//! Tool handles backed by a provider session.

use crate::client::{McpClient, RemoteTool};
use core::fmt;
use lodestar_tools::{Tool, ToolDefinition, ToolError, ToolFuture};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One declared tool on one provider.
///
/// Identity is the (provider, tool name) pair. Calls go through the client of
/// the session that fetched the handle.
pub struct McpTool {
    provider: String,
    remote: RemoteTool,
    client: Arc<dyn McpClient>,
}

impl McpTool {
    pub(crate) fn new(provider: impl Into<String>, remote: RemoteTool, client: Arc<dyn McpClient>) -> Self {
        Self {
            provider: provider.into(),
            remote,
            client,
        }
    }

    /// Returns the provider this tool belongs to.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.remote.name
    }
}

impl fmt::Debug for McpTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpTool")
            .field("provider", &self.provider)
            .field("name", &self.remote.name)
            .finish_non_exhaustive()
    }
}

impl Tool for McpTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.remote.name.clone(),
            description: self.remote.description.clone(),
            parameters: self.remote.input_schema.clone(),
        }
    }

    fn origin(&self) -> Option<&str> {
        Some(&self.provider)
    }

    fn execute(&self, args: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let args = match args {
                Value::Null => Value::Object(Map::new()),
                Value::Object(_) => args,
                other => {
                    return Err(ToolError::parameter_error(format!(
                        "{}/{}: arguments must be a JSON object, got {}",
                        self.provider,
                        self.remote.name,
                        json_kind(&other)
                    )));
                }
            };
            self.client
                .call_tool(&self.remote.name, args)
                .await
                .map_err(|err| {
                    ToolError::execution_error(format!(
                        "{}/{}: {err}",
                        self.provider, self.remote.name
                    ))
                })
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
