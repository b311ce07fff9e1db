//! Readiness report for a declarative agent definition.
//!
//! The `lodestar-check` binary loads an agent file, validates it, and prints
//! one line per MCP server: its provisioning mode, the placeholders it
//! references, and which of them the current environment leaves unbound.
//!
//! ```text
//! agent: anthropic/claude-sonnet-4-5 (max 100 iterations)
//! sandbox: filesystem at /workspace
//!   search   static   tools: search, fetch
//!   github   dynamic  tools: search_issues  placeholders: GITHUB_TOKEN  unbound: GITHUB_TOKEN
//! ```

use core::fmt;
use lodestar_mcp::{AgentConfig, ProvisioningMode, SubstitutionContext};

/// Prefix of environment variables that bind placeholders.
pub const ENV_PREFIX: &str = "LODESTAR_";

/// What one MCP server needs before it can be provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    /// Provider name.
    pub name: String,
    /// Static or dynamic.
    pub mode: ProvisioningMode,
    /// Selected tool names, in declaration order.
    pub tools: Vec<String>,
    /// Placeholder names referenced by the url and headers.
    pub placeholders: Vec<String>,
    /// Placeholders the supplied bindings do not cover.
    pub unbound: Vec<String>,
}

/// Readiness of a whole agent definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    /// Model reference.
    pub model: String,
    /// Recursion limit of the reasoning loop.
    pub max_iterations: u32,
    /// Declared sandbox kind and root, if any.
    pub sandbox: Option<String>,
    /// One entry per declared MCP server.
    pub providers: Vec<ProviderReport>,
    /// Non-fatal findings from validation.
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Builds the report for `config` against `bindings`.
    #[must_use]
    pub fn new(config: &AgentConfig, bindings: &SubstitutionContext) -> Self {
        let providers = config
            .providers()
            .iter()
            .map(|(name, provider)| {
                let placeholders: Vec<String> = provider.placeholder_names().into_iter().collect();
                let unbound = placeholders
                    .iter()
                    .filter(|p| bindings.get(p).is_none())
                    .cloned()
                    .collect();
                ProviderReport {
                    name: name.clone(),
                    mode: provider.mode(),
                    tools: config.tools_for(name).unwrap_or_default().to_vec(),
                    placeholders,
                    unbound,
                }
            })
            .collect();

        Self {
            model: config.model().to_string(),
            max_iterations: config.max_iterations(),
            sandbox: config
                .sandbox()
                .map(|s| format!("{} at {}", s.kind(), s.root_dir().display())),
            providers,
            warnings: config.warnings().to_vec(),
        }
    }

    /// Returns `true` if every placeholder has a binding.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.providers.iter().all(|p| p.unbound.is_empty())
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "agent: {} (max {} iterations)",
            self.model, self.max_iterations
        )?;
        if let Some(sandbox) = &self.sandbox {
            writeln!(f, "sandbox: {sandbox}")?;
        }
        let width = self.providers.iter().map(|p| p.name.len()).max().unwrap_or(0);
        for provider in &self.providers {
            write!(
                f,
                "  {:<width$}  {:<8} tools: {}",
                provider.name,
                provider.mode.to_string(),
                provider.tools.join(", ")
            )?;
            if !provider.placeholders.is_empty() {
                write!(f, "  placeholders: {}", provider.placeholders.join(", "))?;
            }
            if !provider.unbound.is_empty() {
                write!(f, "  unbound: {}", provider.unbound.join(", "))?;
            }
            writeln!(f)?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}
