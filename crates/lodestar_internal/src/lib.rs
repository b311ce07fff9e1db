//! # Lodestar Internal Library
//!
//! Re-exports the Lodestar crates for convenience.

/// Tracing subscriber setup.
pub use lodestar_core;

/// Tool trait and registry.
pub use lodestar_tools;

/// MCP configuration, sessions and per-invocation provisioning.
pub use lodestar_mcp;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use lodestar_core::{TracingConfig, TracingFormat};
    pub use lodestar_mcp::{
        AgentConfig, Connector, InvocationHooks, McpClient, ProvisionError, ProvisioningMode,
        RunContext, SandboxConfig, SubstitutionContext, ToolProvisioner, run_invocation,
    };
    pub use lodestar_tools::{Tool, ToolDefinition, ToolError, ToolRegistry};
}
