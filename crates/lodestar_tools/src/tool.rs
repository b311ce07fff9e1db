//! The core [`Tool`] trait for executable tools.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

/// LLM-facing description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses to call the tool.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON schema of the tool's arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Creates a definition with an empty object schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    /// Sets the argument schema.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A tool that can be invoked by an LLM agent.
///
/// Tools expose a [`ToolDefinition`] (name, description, JSON schema) for the LLM,
/// and an async [`execute`](Tool::execute) method that runs with the tool's
/// captured environment.
pub trait Tool: Send + Sync + 'static {
    /// Returns the LLM-facing tool definition with JSON schema.
    fn definition(&self) -> ToolDefinition;

    /// Name of the provider this tool was fetched from, if any.
    ///
    /// Together with the definition name this forms the tool's identity.
    fn origin(&self) -> Option<&str> {
        None
    }

    /// Executes the tool with JSON arguments.
    fn execute(&self, args: Value) -> ToolFuture<'_>;
}
