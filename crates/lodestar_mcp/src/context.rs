//! Per-invocation context threaded through the lifecycle hooks.
//!
//! A [`RunContext`] is created by the orchestrator for each invocation and
//! passed by `&mut` to both hooks. It carries the caller's
//! [`SubstitutionContext`] (if any) and the invocation-scoped state the
//! provisioning middleware writes to. Nothing in it is shared between
//! invocations.

use crate::session::SessionKey;
use crate::template::Bindings;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use lodestar_tools::ToolRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// SubstitutionContext
// ─────────────────────────────────────────────────────────────────────────────

/// Placeholder values supplied by the caller for one invocation.
///
/// Values usually carry credentials, so `Debug` prints names only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SubstitutionContext {
    values: BTreeMap<String, String>,
}

impl SubstitutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a context from environment variables starting with `prefix`.
    ///
    /// The prefix is stripped, so with prefix `LODESTAR_` the variable
    /// `LODESTAR_TOKEN` binds the placeholder `TOKEN`.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(std::env::vars(), prefix)
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>, prefix: &str) -> Self {
        vars.into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_owned(), value))
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubstitutionContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Bindings for SubstitutionContext {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl fmt::Debug for SubstitutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstitutionContext")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InvocationId
// ─────────────────────────────────────────────────────────────────────────────

/// Process-unique identifier of one invocation, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(u64);

impl InvocationId {
    /// Allocates the next identifier.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv-{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InvocationState
// ─────────────────────────────────────────────────────────────────────────────

/// What the entry hook published for this invocation.
#[derive(Debug)]
pub(crate) struct Provisioned {
    /// The published tool set.
    pub(crate) tools: Arc<ToolRegistry>,
    /// Substitutions the provisioning was resolved with.
    pub(crate) substitutions: Option<SubstitutionContext>,
    /// Dynamic sessions held by this invocation.
    pub(crate) dynamic_keys: Vec<SessionKey>,
}

/// Invocation-scoped state written by the provisioning middleware.
///
/// Empty until the entry hook succeeds; cleared by the exit hook.
#[derive(Debug, Default)]
pub struct InvocationState {
    pub(crate) provisioned: Option<Provisioned>,
}

impl InvocationState {
    /// Returns `true` once the entry hook has completed for this invocation.
    #[must_use]
    pub fn is_provisioned(&self) -> bool {
        self.provisioned.is_some()
    }

    /// Returns the published tool set, if provisioning completed.
    #[must_use]
    pub fn tools(&self) -> Option<&Arc<ToolRegistry>> {
        self.provisioned.as_ref().map(|p| &p.tools)
    }

    /// Returns the keys of dynamic sessions this invocation holds.
    #[must_use]
    pub fn dynamic_session_keys(&self) -> &[SessionKey] {
        self.provisioned
            .as_ref()
            .map(|p| p.dynamic_keys.as_slice())
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RunContext
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the lifecycle hooks see about one invocation.
#[derive(Debug)]
pub struct RunContext {
    id: InvocationId,
    substitutions: Option<SubstitutionContext>,
    state: InvocationState,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Creates a context without substitution values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: InvocationId::next(),
            substitutions: None,
            state: InvocationState::default(),
        }
    }

    /// Creates a context carrying substitution values.
    #[must_use]
    pub fn with_substitutions(substitutions: SubstitutionContext) -> Self {
        Self {
            substitutions: Some(substitutions),
            ..Self::new()
        }
    }

    /// Returns the invocation identifier.
    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the substitution values, if the caller supplied any.
    #[must_use]
    pub fn substitutions(&self) -> Option<&SubstitutionContext> {
        self.substitutions.as_ref()
    }

    /// Replaces the substitution values.
    ///
    /// Has no effect on tools already provisioned for this invocation.
    pub fn set_substitutions(&mut self, substitutions: Option<SubstitutionContext>) {
        self.substitutions = substitutions;
    }

    /// Returns the invocation-scoped state.
    #[must_use]
    pub fn state(&self) -> &InvocationState {
        &self.state
    }

    /// Returns the tools published for this invocation.
    ///
    /// This is where the reasoning loop reads its tools from.
    #[must_use]
    pub fn tools(&self) -> Option<&Arc<ToolRegistry>> {
        self.state.tools()
    }

    pub(crate) fn state_mut(&mut self) -> &mut InvocationState {
        &mut self.state
    }
}
