//! Provider sessions and their keyed cache.
//!
//! A [`Session`] is one live connection to a provider plus the tool handles
//! fetched from it, restricted to the declared selection. The
//! [`SessionManager`] caches sessions by [`SessionKey`], the provider name
//! together with the resolved connection parameters, so two invocations only
//! share a session when every parameter, credentials included, is identical.
//!
//! # Concurrency
//!
//! Each key owns a slot holding a [`tokio::sync::OnceCell`]. The map itself
//! is behind a [`parking_lot::Mutex`] that is held only to look up or insert
//! a slot, never across an `.await`. Concurrent first use of one key runs a
//! single connection attempt; the other callers wait for its result. If the
//! attempt fails, the slot is dropped and the next caller tries again.

use crate::client::{Connector, RemoteTool};
use crate::config::Transport;
use crate::error::ProvisionError;
use crate::tool::McpTool;
use core::fmt;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

// ─────────────────────────────────────────────────────────────────────────────
// ConnectionParams / SessionKey
// ─────────────────────────────────────────────────────────────────────────────

/// Fully resolved connection parameters of one provider.
///
/// `Debug` shows header names but not their values.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionParams {
    transport: Transport,
    url: String,
    headers: BTreeMap<String, String>,
}

impl ConnectionParams {
    /// Creates connection parameters.
    #[must_use]
    pub fn new(transport: Transport, url: impl Into<String>, headers: BTreeMap<String, String>) -> Self {
        Self {
            transport,
            url: url.into(),
            headers,
        }
    }

    /// Returns the transport kind.
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Returns the endpoint address.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("transport", &self.transport)
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Cache key of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    provider: String,
    params: ConnectionParams,
}

impl SessionKey {
    /// Creates a key.
    #[must_use]
    pub fn new(provider: impl Into<String>, params: ConnectionParams) -> Self {
        Self {
            provider: provider.into(),
            params,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the resolved connection parameters.
    #[must_use]
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// A live provider connection and the declared tools fetched from it.
pub struct Session {
    key: SessionKey,
    tools: Vec<Arc<McpTool>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Session {
    /// Returns the key this session was created for.
    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.key.provider()
    }

    /// Returns the tool handles, in declaration order.
    #[must_use]
    pub fn tools(&self) -> &[Arc<McpTool>] {
        &self.tools
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionManager
// ─────────────────────────────────────────────────────────────────────────────

type Slot = Arc<OnceCell<Arc<Session>>>;

/// Keyed cache of provider sessions.
///
/// Sessions are never torn down by the manager itself. Whoever obtained a
/// session decides when to [`release`](Self::release) it; outstanding
/// `Arc<Session>` handles stay usable after release.
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    slots: Mutex<HashMap<SessionKey, Slot>>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates an empty manager that opens connections with `connector`.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `(provider, params)`, connecting if needed.
    ///
    /// A new session connects, lists the provider's tools, and keeps a handle
    /// for each name in `declared`, in that order. An existing session is
    /// returned as-is without contacting the provider.
    ///
    /// # Errors
    ///
    /// - [`ProvisionError::Connection`] if connecting or listing fails.
    /// - [`ProvisionError::ToolNotFound`] if a declared tool is not listed.
    pub async fn get_session(
        &self,
        provider: &str,
        params: &ConnectionParams,
        declared: &[String],
    ) -> Result<Arc<Session>, ProvisionError> {
        let key = SessionKey::new(provider, params.clone());
        let slot = Arc::clone(self.slots.lock().entry(key.clone()).or_default());

        if let Some(session) = slot.get() {
            tracing::debug!(provider, "reusing MCP session");
            return Ok(Arc::clone(session));
        }

        match slot.get_or_try_init(|| self.open(&key, declared)).await {
            Ok(session) => Ok(Arc::clone(session)),
            Err(err) => {
                self.discard_empty(&key, &slot);
                Err(err)
            }
        }
    }

    async fn open(&self, key: &SessionKey, declared: &[String]) -> Result<Arc<Session>, ProvisionError> {
        let provider = key.provider();
        tracing::debug!(provider, transport = %key.params().transport(), "connecting to MCP server");

        let client = self.connector.connect(key.params()).await?;
        let listed = client.list_tools().await?;
        let mut by_name: HashMap<&str, &RemoteTool> =
            listed.iter().map(|t| (t.name.as_str(), t)).collect();

        let mut tools = Vec::with_capacity(declared.len());
        for name in declared {
            let Some(remote) = by_name.remove(name.as_str()) else {
                return Err(ProvisionError::ToolNotFound {
                    provider: provider.to_owned(),
                    tool: name.clone(),
                });
            };
            tools.push(Arc::new(McpTool::new(
                provider,
                remote.clone(),
                Arc::clone(&client),
            )));
        }

        tracing::info!(
            provider,
            tools = tools.len(),
            offered = listed.len(),
            "MCP session established"
        );

        Ok(Arc::new(Session {
            key: key.clone(),
            tools,
        }))
    }

    /// Removes a slot left uninitialized by a failed attempt.
    fn discard_empty(&self, key: &SessionKey, slot: &Slot) {
        let mut slots = self.slots.lock();
        if let Some(current) = slots.get(key)
            && Arc::ptr_eq(current, slot)
            && !current.initialized()
        {
            slots.remove(key);
        }
    }

    /// Drops the cached session for `key`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn release(&self, key: &SessionKey) -> bool {
        let removed = self.slots.lock().remove(key).is_some();
        if removed {
            tracing::debug!(provider = key.provider(), "released MCP session");
        }
        removed
    }

    /// Returns the cached session for `key` without connecting.
    #[must_use]
    pub fn cached(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.slots.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Returns `true` if a session for `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    /// Returns the number of cached sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Returns `true` if no sessions are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
