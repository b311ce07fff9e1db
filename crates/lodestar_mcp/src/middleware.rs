//! Per-invocation tool provisioning.
//!
//! The reasoning loop owns control flow and calls two hooks around each
//! invocation, described by [`InvocationHooks`]. [`ToolProvisioner`]
//! implements them:
//!
//! - **Entry** ([`on_invocation_start`](InvocationHooks::on_invocation_start)):
//!   resolves every provider's connection parameters, obtains a session per
//!   provider, and publishes the union of their tools into the
//!   [`RunContext`]. Runs at most once per invocation; a repeated call returns
//!   the tools already published.
//! - **Exit** ([`on_invocation_end`](InvocationHooks::on_invocation_end)):
//!   clears the invocation state and releases sessions that were resolved
//!   from this invocation's substitutions.
//!
//! # Static and dynamic providers
//!
//! A provider whose url and headers contain no placeholders is *static*: its
//! session is created on first use and shared by every later invocation. A
//! provider with placeholders is *dynamic*: each invocation resolves the
//! placeholders from its own [`SubstitutionContext`](crate::SubstitutionContext)
//! and gets a session keyed on the resolved values, so invocations carrying
//! different credentials never share a connection.
//!
//! # Failure
//!
//! Provisioning is all-or-nothing. If any provider fails, the entry hook
//! returns the error, nothing is published, and dynamic sessions acquired on
//! the way are released. Unbound placeholders are reported once, across all
//! providers, before anything connects. The same release happens if the entry hook's future
//! is dropped before it completes.
//!
//! # Example
//!
//! ```ignore
//! let provisioner = ToolProvisioner::new(&config, Arc::new(HttpConnector::default()));
//!
//! let mut ctx = RunContext::with_substitutions(
//!     SubstitutionContext::new().with("GITHUB_TOKEN", token),
//! );
//! let tools = provisioner.on_invocation_start(&mut ctx).await?;
//! // ... reasoning steps call tools.execute(name, args) ...
//! provisioner.on_invocation_end(&mut ctx).await;
//! ```

use crate::client::Connector;
use crate::config::{AgentConfig, ProviderConfig, ProvisioningMode};
use crate::context::{Provisioned, RunContext};
use crate::error::{MissingBindingError, ProvisionError, ResolveError};
use crate::session::{ConnectionParams, Session, SessionKey, SessionManager};
use async_trait::async_trait;
use core::fmt;
use core::future::Future;
use lodestar_tools::{Insertion, Tool, ToolRegistry};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// InvocationHooks
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle hooks an orchestrator calls around each invocation.
///
/// The orchestrator calls the entry hook before the first reasoning step and
/// the exit hook after the last one. Implementations make no assumption
/// about how many steps run in between.
#[async_trait]
pub trait InvocationHooks: Send + Sync {
    /// Prepares the invocation and returns the tools it may call.
    ///
    /// # Errors
    ///
    /// Any error aborts the invocation; no tools are published.
    async fn on_invocation_start(
        &self,
        ctx: &mut RunContext,
    ) -> Result<Arc<ToolRegistry>, ProvisionError>;

    /// Releases invocation-scoped state.
    async fn on_invocation_end(&self, ctx: &mut RunContext);
}

/// Runs `body` between the entry and exit hooks.
///
/// The exit hook runs whether or not `body` is reached.
///
/// # Errors
///
/// Returns the entry hook's error without running `body`.
pub async fn run_invocation<H, F, Fut, T>(
    hooks: &H,
    ctx: &mut RunContext,
    body: F,
) -> Result<T, ProvisionError>
where
    H: InvocationHooks + ?Sized,
    F: FnOnce(Arc<ToolRegistry>) -> Fut,
    Fut: Future<Output = T>,
{
    let tools = match hooks.on_invocation_start(ctx).await {
        Ok(tools) => tools,
        Err(err) => {
            hooks.on_invocation_end(ctx).await;
            return Err(err);
        }
    };
    let output = body(tools).await;
    hooks.on_invocation_end(ctx).await;
    Ok(output)
}

// ─────────────────────────────────────────────────────────────────────────────
// ToolProvisioner
// ─────────────────────────────────────────────────────────────────────────────

/// One provider as the provisioner sees it.
struct ProviderPlan {
    name: String,
    config: ProviderConfig,
    tools: Vec<String>,
    /// Declared parameters, for static providers only.
    static_params: Option<ConnectionParams>,
}

impl ProviderPlan {
    fn params_for(&self, ctx: &RunContext) -> Result<ConnectionParams, ProvisionError> {
        if let Some(params) = &self.static_params {
            return Ok(params.clone());
        }
        let substitutions =
            ctx.substitutions()
                .ok_or_else(|| ProvisionError::ConfigurationMissing {
                    provider: self.name.clone(),
                })?;
        self.config
            .resolve(substitutions)
            .map_err(|err| match err {
                ResolveError::MissingBinding(source) => ProvisionError::MissingBinding {
                    providers: vec![self.name.clone()],
                    source,
                },
                source @ ResolveError::InsecureEndpoint => ProvisionError::InsecureEndpoint {
                    provider: self.name.clone(),
                    source,
                },
            })
    }
}

/// Provisions MCP tools for each invocation of an agent.
///
/// Owns the session cache, so static sessions live exactly as long as the
/// provisioner. Share one provisioner (e.g. in an `Arc`) across concurrent
/// invocations of the same agent.
pub struct ToolProvisioner {
    providers: Vec<ProviderPlan>,
    sessions: SessionManager,
}

impl fmt::Debug for ToolProvisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolProvisioner")
            .field(
                "providers",
                &self.provider_modes().collect::<Vec<_>>(),
            )
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl ToolProvisioner {
    /// Creates a provisioner for the MCP servers declared in `config`.
    #[must_use]
    pub fn new(config: &AgentConfig, connector: Arc<dyn Connector>) -> Self {
        let providers = config
            .providers()
            .iter()
            .map(|(name, provider)| ProviderPlan {
                name: name.clone(),
                config: provider.clone(),
                tools: config.tools_for(name).unwrap_or_default().to_vec(),
                static_params: (provider.mode() == ProvisioningMode::Static)
                    .then(|| provider.connection_params()),
            })
            .collect();

        Self {
            providers,
            sessions: SessionManager::new(connector),
        }
    }

    /// Returns each provider's name and provisioning mode.
    pub fn provider_modes(&self) -> impl Iterator<Item = (&str, ProvisioningMode)> {
        self.providers
            .iter()
            .map(|p| (p.name.as_str(), p.config.mode()))
    }

    /// Returns the shared session of a static provider, if it has been created.
    #[must_use]
    pub fn static_session(&self, provider: &str) -> Option<Arc<Session>> {
        let plan = self.providers.iter().find(|p| p.name == provider)?;
        let params = plan.static_params.clone()?;
        self.sessions.cached(&SessionKey::new(provider, params))
    }

    /// Returns the session cache.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    async fn provision(&self, ctx: &RunContext) -> Result<Provisioned, ProvisionError> {
        // Every provider resolves before any provider connects.
        let mut resolved = Vec::with_capacity(self.providers.len());
        let mut unbound_providers = Vec::new();
        let mut unbound_names = Vec::new();
        for plan in &self.providers {
            match plan.params_for(ctx) {
                Ok(params) => resolved.push((plan, params)),
                Err(ProvisionError::MissingBinding { providers, source }) => {
                    unbound_providers.extend(providers);
                    unbound_names.extend(source.names().iter().cloned());
                }
                Err(err) => return Err(err),
            }
        }
        if !unbound_providers.is_empty() {
            return Err(ProvisionError::MissingBinding {
                providers: unbound_providers,
                source: MissingBindingError::new(unbound_names),
            });
        }

        let mut lease = DynamicLease::new(&self.sessions);
        for (plan, params) in &resolved {
            if plan.static_params.is_none() {
                lease.hold(SessionKey::new(plan.name.as_str(), params.clone()));
            }
        }

        let sessions = futures::future::try_join_all(resolved.iter().map(|(plan, params)| {
            self.sessions.get_session(&plan.name, params, &plan.tools)
        }))
        .await?;

        let mut registry = ToolRegistry::new();
        for tool in sessions.iter().flat_map(|s| s.tools()) {
            let handle: Arc<dyn Tool> = tool.clone();
            if let Insertion::Conflict { existing_origin } = registry.insert(handle) {
                tracing::warn!(
                    invocation = %ctx.id(),
                    tool = tool.name(),
                    provider = tool.provider(),
                    kept = existing_origin.as_deref().unwrap_or("local"),
                    "tool name already provided by another MCP server, skipping"
                );
            }
        }

        Ok(Provisioned {
            tools: Arc::new(registry),
            substitutions: ctx.substitutions().cloned(),
            dynamic_keys: lease.keep(),
        })
    }
}

#[async_trait]
impl InvocationHooks for ToolProvisioner {
    async fn on_invocation_start(
        &self,
        ctx: &mut RunContext,
    ) -> Result<Arc<ToolRegistry>, ProvisionError> {
        if let Some(done) = &ctx.state().provisioned {
            if done.substitutions.as_ref() == ctx.substitutions() {
                tracing::debug!(invocation = %ctx.id(), "tools already provisioned");
            } else {
                tracing::warn!(
                    invocation = %ctx.id(),
                    "entry hook re-entered with different substitutions; keeping the tools from the first call"
                );
            }
            return Ok(Arc::clone(&done.tools));
        }

        let provisioned = self.provision(ctx).await?;
        let tools = Arc::clone(&provisioned.tools);
        tracing::info!(
            invocation = %ctx.id(),
            providers = self.providers.len(),
            tools = tools.len(),
            "MCP tools provisioned"
        );
        ctx.state_mut().provisioned = Some(provisioned);
        Ok(tools)
    }

    async fn on_invocation_end(&self, ctx: &mut RunContext) {
        let Some(done) = ctx.state_mut().provisioned.take() else {
            return;
        };
        for key in &done.dynamic_keys {
            self.sessions.release(key);
        }
        tracing::debug!(
            invocation = %ctx.id(),
            released = done.dynamic_keys.len(),
            "invocation state cleared"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DynamicLease
// ─────────────────────────────────────────────────────────────────────────────

/// Releases dynamic sessions unless provisioning completes.
struct DynamicLease<'a> {
    sessions: &'a SessionManager,
    keys: Vec<SessionKey>,
}

impl<'a> DynamicLease<'a> {
    fn new(sessions: &'a SessionManager) -> Self {
        Self {
            sessions,
            keys: Vec::new(),
        }
    }

    fn hold(&mut self, key: SessionKey) {
        self.keys.push(key);
    }

    /// Hands the keys over to the invocation state.
    fn keep(mut self) -> Vec<SessionKey> {
        core::mem::take(&mut self.keys)
    }
}

impl Drop for DynamicLease<'_> {
    fn drop(&mut self) {
        for key in &self.keys {
            self.sessions.release(key);
        }
    }
}
