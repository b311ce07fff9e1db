//! Declarative MCP tool provisioning for agent reasoning loops.
//!
//! Declare MCP servers and the tools to take from each, and this crate
//! connects, fetches exactly those tools, and hands them to the reasoning
//! loop for each invocation. Credentials can be fixed in the configuration
//! or supplied per invocation through `{{NAME}}` placeholders.
//!
//! # Architecture
//!
//! - [`template`]: placeholder detection and substitution
//! - [`AgentConfig`]: validated agent definition ([`config`])
//! - [`SessionManager`]: keyed cache of provider connections ([`session`])
//! - [`ToolProvisioner`]: the [`InvocationHooks`] implementation that ties
//!   the above together for each invocation ([`middleware`])
//! - [`Connector`] / [`McpClient`]: the transport seam, implemented outside
//!   this crate
//!
//! # Example
//!
//! ```ignore
//! use lodestar_mcp::{AgentConfig, RunContext, SubstitutionContext, ToolProvisioner, run_invocation};
//!
//! let config = AgentConfig::from_path("agent.json")?;
//! let provisioner = ToolProvisioner::new(&config, connector);
//!
//! let mut ctx = RunContext::with_substitutions(
//!     SubstitutionContext::new().with("GITHUB_TOKEN", token),
//! );
//! let answer = run_invocation(&provisioner, &mut ctx, |tools| async move {
//!     reasoning_loop(&config, &tools).await
//! })
//! .await?;
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod session;
pub mod template;
pub mod tool;

pub use client::{Connector, McpClient, RemoteTool};
pub use config::{
    AgentConfig, AgentConfigBuilder, ProviderConfig, ProvisioningMode, SandboxConfig, Transport,
};
pub use context::{InvocationId, InvocationState, RunContext, SubstitutionContext};
pub use error::{
    ConfigLoadError, ConnectionError, MissingBindingError, ProvisionError, ResolveError,
    ValidationError,
};
pub use middleware::{InvocationHooks, ToolProvisioner, run_invocation};
pub use session::{ConnectionParams, Session, SessionKey, SessionManager};
pub use tool::McpTool;
