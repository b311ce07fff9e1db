//! Shared test helpers: an in-memory MCP connector with call counters.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use async_trait::async_trait;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use core::time::Duration;
use lodestar_mcp::{AgentConfig, ConnectionError, ConnectionParams, Connector, McpClient, RemoteTool};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    lists: AtomicUsize,
    calls: AtomicUsize,
}

/// In-memory connector. Every connection offers the same tool catalog unless
/// a url-specific catalog was registered.
pub struct MockConnector {
    catalog: Vec<RemoteTool>,
    per_url: HashMap<String, Vec<RemoteTool>>,
    counters: Arc<Counters>,
    refuse: AtomicBool,
    delay: Option<Duration>,
    delay_at: HashMap<String, Duration>,
    seen: Mutex<Vec<ConnectionParams>>,
}

impl MockConnector {
    /// A connector whose providers offer `tools`.
    pub fn offering(tools: &[&str]) -> Self {
        Self {
            catalog: catalog(tools),
            per_url: HashMap::new(),
            counters: Arc::default(),
            refuse: AtomicBool::new(false),
            delay: None,
            delay_at: HashMap::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the catalog offered at one url.
    pub fn with_catalog_at(mut self, url: &str, tools: &[&str]) -> Self {
        self.per_url.insert(url.to_string(), catalog(tools));
        self
    }

    /// Makes every connect sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes connects to one url sleep before answering.
    pub fn with_delay_at(mut self, url: &str, delay: Duration) -> Self {
        self.delay_at.insert(url.to_string(), delay);
        self
    }

    /// Makes every subsequent connect fail.
    pub fn refuse_connections(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    /// Number of connections opened.
    pub fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    /// Number of tool listings performed.
    pub fn list_calls(&self) -> usize {
        self.counters.lists.load(Ordering::SeqCst)
    }

    /// Number of tool calls made.
    pub fn tool_calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// Parameters of every connect attempt, in order.
    pub fn seen(&self) -> Vec<ConnectionParams> {
        self.seen.lock().clone()
    }
}

fn catalog(tools: &[&str]) -> Vec<RemoteTool> {
    tools
        .iter()
        .map(|name| RemoteTool::new(*name, format!("The {name} tool.")))
        .collect()
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        params: &ConnectionParams,
    ) -> Result<Arc<dyn McpClient>, ConnectionError> {
        self.seen.lock().push(params.clone());
        if let Some(delay) = self.delay_at.get(params.url()).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ConnectionError::new(format!(
                "connection refused: {}",
                params.url()
            )));
        }
        self.counters.connects.fetch_add(1, Ordering::SeqCst);

        let tools = self
            .per_url
            .get(params.url())
            .unwrap_or(&self.catalog)
            .clone();
        Ok(Arc::new(MockClient {
            tools,
            params: params.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockClient {
    tools: Vec<RemoteTool>,
    params: ConnectionParams,
    counters: Arc<Counters>,
}

#[async_trait]
impl McpClient for MockClient {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, ConnectionError> {
        self.counters.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ConnectionError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if name == "explode" {
            return Err(ConnectionError::new("stream closed"));
        }
        Ok(json!({
            "tool": name,
            "arguments": arguments,
            "url": self.params.url(),
            "authorization": self.params.headers().get("Authorization"),
        }))
    }
}

/// A valid config with the given `mcp_servers` and `mcp_tools` sections.
pub fn agent_config(servers: Value, tools: Value) -> AgentConfig {
    AgentConfig::from_value(json!({
        "system_prompt": "You are a helpful research assistant.",
        "model": "anthropic/claude-sonnet-4-5",
        "mcp_servers": servers,
        "mcp_tools": tools,
    }))
    .expect("test config should be valid")
}
