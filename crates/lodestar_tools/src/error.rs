//! Failures of a tool call.

/// Why a call through [`ToolRegistry::execute`](crate::ToolRegistry::execute)
/// or [`Tool::execute`](crate::Tool::execute) did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The arguments do not have the shape the tool accepts. Nothing was sent.
    #[error("invalid arguments: {0}")]
    ParameterError(String),

    /// The tool ran and failed, or its provider could not be reached.
    #[error("tool call failed: {0}")]
    ExecutionError(String),

    /// No published tool has the requested name.
    #[error("no tool named '{0}' is published")]
    UnknownTool(String),
}

impl ToolError {
    /// Creates a [`ParameterError`](Self::ParameterError).
    pub fn parameter_error(msg: impl Into<String>) -> Self {
        Self::ParameterError(msg.into())
    }

    /// Creates an [`ExecutionError`](Self::ExecutionError).
    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Creates an [`UnknownTool`](Self::UnknownTool).
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Returns `true` if the call was refused before reaching the tool.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::ParameterError(_) | Self::UnknownTool(_))
    }
}
