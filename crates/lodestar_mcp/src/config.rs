//! Declarative agent configuration and its validation.
//!
//! An [`AgentConfig`] is built once from caller-supplied input, either raw
//! JSON ([`AgentConfig::from_value`], [`AgentConfig::from_path`]) or the
//! [`AgentConfigBuilder`]. Both paths run the same rules and report every
//! violation at once in a [`ValidationError`]. A built config is read-only.
//!
//! # Input shape
//!
//! ```json
//! {
//!   "system_prompt": "You are a research assistant.",
//!   "model": "anthropic/claude-sonnet-4-5",
//!   "mcp_servers": {
//!     "github": {
//!       "transport": "http",
//!       "url": "https://api.example.com/mcp",
//!       "headers": { "Authorization": "Bearer {{GITHUB_TOKEN}}" }
//!     }
//!   },
//!   "mcp_tools": { "github": ["search_issues", "get_issue"] },
//!   "max_iterations": 100,
//!   "temperature": 0.2,
//!   "sandbox_config": { "type": "filesystem", "root_dir": "/workspace" }
//! }
//! ```

use crate::error::{ConfigLoadError, MissingBindingError, ResolveError, ValidationError};
use crate::session::ConnectionParams;
use crate::template::{self, Bindings};
use core::fmt;
use core::ops::RangeInclusive;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Minimum length of the trimmed system prompt.
pub const MIN_SYSTEM_PROMPT_LEN: usize = 10;

/// Iteration ceiling used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Iteration ceilings above this are accepted with a warning.
pub const MAX_ITERATIONS_WARN_THRESHOLD: u32 = 500;

/// Accepted sampling temperatures.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// Sandbox root used when a filesystem sandbox names none.
pub const DEFAULT_SANDBOX_ROOT: &str = ".";

const SANDBOX_TYPES: &str = "filesystem, modal, runloop, daytona, harbor";

// ─────────────────────────────────────────────────────────────────────────────
// Transport / ProvisioningMode
// ─────────────────────────────────────────────────────────────────────────────

/// How a provider is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Transport {
    /// MCP streamable HTTP.
    #[default]
    #[serde(rename = "http", alias = "streamable_http")]
    StreamableHttp,
}

impl Transport {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "http" | "streamable_http" => Some(Self::StreamableHttp),
            _ => None,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamableHttp => f.write_str("http"),
        }
    }
}

/// Whether a provider's connection parameters are fixed or per-invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisioningMode {
    /// No placeholders: one session for the lifetime of the provisioner.
    Static,
    /// Placeholders present: parameters are resolved for every invocation.
    Dynamic,
}

impl fmt::Display for ProvisioningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProviderConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Connection descriptor of one MCP server.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    transport: Transport,
    url: String,
    headers: IndexMap<String, String>,
    auth_from_context: bool,
    mode: ProvisioningMode,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Header values may hold literal credentials.
        f.debug_struct("ProviderConfig")
            .field("transport", &self.transport)
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("auth_from_context", &self.auth_from_context)
            .field("mode", &self.mode)
            .finish()
    }
}

impl ProviderConfig {
    fn new(
        transport: Transport,
        url: String,
        headers: IndexMap<String, String>,
        auth_from_context: bool,
    ) -> Self {
        let dynamic = template::str_has_placeholder(&url)
            || headers.values().any(|v| template::str_has_placeholder(v));
        Self {
            transport,
            url,
            headers,
            auth_from_context,
            mode: if dynamic {
                ProvisioningMode::Dynamic
            } else {
                ProvisioningMode::Static
            },
        }
    }

    /// Returns the transport kind.
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Returns the endpoint address as declared, placeholders included.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the declared headers, placeholders included.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Returns whether the declaration asked for context-supplied credentials.
    #[must_use]
    pub fn auth_from_context(&self) -> bool {
        self.auth_from_context
    }

    /// Returns the provisioning mode implied by the declared values.
    #[must_use]
    pub fn mode(&self) -> ProvisioningMode {
        self.mode
    }

    /// Returns every placeholder name referenced by the url or headers.
    #[must_use]
    pub fn placeholder_names(&self) -> BTreeSet<String> {
        core::iter::once(self.url.as_str())
            .chain(self.headers.values().map(String::as_str))
            .flat_map(template::str_placeholder_names)
            .map(str::to_owned)
            .collect()
    }

    /// Returns the connection parameters exactly as declared.
    #[must_use]
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams::new(
            self.transport,
            self.url.clone(),
            self.headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Resolves placeholders in the url and headers.
    ///
    /// The resolved url must pass the same endpoint rules as the declared
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingBinding`] naming every placeholder that
    /// `bindings` does not cover, across the url and all headers, and
    /// [`ResolveError::InsecureEndpoint`] if the substituted url is refused.
    pub fn resolve(&self, bindings: &impl Bindings) -> Result<ConnectionParams, ResolveError> {
        let mut missing = BTreeSet::new();
        let url = template::substitute_str_into(&self.url, bindings, &mut missing);
        let headers: BTreeMap<String, String> = self
            .headers
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    template::substitute_str_into(v, bindings, &mut missing),
                )
            })
            .collect();

        if !missing.is_empty() {
            return Err(MissingBindingError::new(missing).into());
        }
        if check_endpoint(&url).is_err() {
            return Err(ResolveError::InsecureEndpoint);
        }
        Ok(ConnectionParams::new(self.transport, url, headers))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SandboxConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Execution sandbox declared for the agent.
///
/// Only declared and validated here; the reasoning loop decides what to do
/// with it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SandboxConfig {
    /// Local filesystem access below `root_dir`.
    Filesystem {
        /// Directory the agent's file operations are confined to.
        root_dir: PathBuf,
    },
}

impl SandboxConfig {
    /// A filesystem sandbox rooted at `root_dir`.
    pub fn filesystem(root_dir: impl Into<PathBuf>) -> Self {
        Self::Filesystem {
            root_dir: root_dir.into(),
        }
    }

    /// Returns the `type` name used in declarations.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filesystem { .. } => "filesystem",
        }
    }

    /// Returns the sandbox root directory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        match self {
            Self::Filesystem { root_dir } => root_dir,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Filesystem { root_dir } => serde_json::json!({
                "type": self.kind(),
                "root_dir": root_dir.to_string_lossy(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AgentConfig
// ─────────────────────────────────────────────────────────────────────────────

/// A validated agent definition.
///
/// Holds the system prompt, model reference, MCP servers, the tools selected
/// from each server, and generation limits. There are no mutators: to change
/// an agent, build a new config.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    system_prompt: String,
    model: String,
    providers: IndexMap<String, ProviderConfig>,
    tools: IndexMap<String, Vec<String>>,
    max_iterations: u32,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    sandbox: Option<SandboxConfig>,
    warnings: Vec<String>,
}

impl AgentConfig {
    /// Starts building a config programmatically.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Validates raw declarative input.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every violated rule, including
    /// fields of the wrong JSON type.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();
        let draft = Draft::from_value(value, &mut violations);
        draft.validate(violations)
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError::Json`] for malformed JSON and
    /// [`ConfigLoadError::Invalid`] for a well-formed but invalid config.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigLoadError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value)?)
    }

    /// Reads, parses, and validates a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError::Io`] if the file cannot be read, otherwise
    /// as [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Returns the system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns the model reference.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the declared MCP servers, in declaration order.
    #[must_use]
    pub fn providers(&self) -> &IndexMap<String, ProviderConfig> {
        &self.providers
    }

    /// Returns one MCP server declaration.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Returns the tool selection, keyed by provider name.
    #[must_use]
    pub fn tools(&self) -> &IndexMap<String, Vec<String>> {
        &self.tools
    }

    /// Returns the tools selected from one provider.
    #[must_use]
    pub fn tools_for(&self, provider: &str) -> Option<&[String]> {
        self.tools.get(provider).map(Vec::as_slice)
    }

    /// Returns the iteration ceiling for the reasoning loop.
    #[must_use]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Returns the sampling temperature, if configured.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Returns the output length ceiling, if configured.
    #[must_use]
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Returns the declared execution sandbox, if any.
    #[must_use]
    pub fn sandbox(&self) -> Option<&SandboxConfig> {
        self.sandbox.as_ref()
    }

    /// Returns non-fatal findings from validation.
    ///
    /// Each was also emitted as a `tracing` warning when the config was built.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns every placeholder name referenced by any provider.
    #[must_use]
    pub fn placeholder_names(&self) -> BTreeSet<String> {
        self.providers
            .values()
            .flat_map(ProviderConfig::placeholder_names)
            .collect()
    }

    /// Returns `true` if any provider needs per-invocation substitution.
    #[must_use]
    pub fn requires_substitutions(&self) -> bool {
        self.providers
            .values()
            .any(|p| p.mode() == ProvisioningMode::Dynamic)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AgentConfigBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Programmatic construction of an [`AgentConfig`].
///
/// # Example
///
/// ```
/// use lodestar_mcp::AgentConfig;
///
/// let config = AgentConfig::builder()
///     .system_prompt("You triage incoming support tickets.")
///     .model("anthropic/claude-sonnet-4-5")
///     .provider("tickets", "https://tickets.example.com/mcp")
///     .header("tickets", "Authorization", "Bearer {{TICKETS_TOKEN}}")
///     .tools("tickets", ["list_tickets", "update_ticket"])
///     .build()
///     .unwrap();
///
/// assert!(config.requires_substitutions());
/// ```
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    draft: Draft,
}

impl AgentConfigBuilder {
    /// Sets the system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.draft.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the model reference.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.draft.model = Some(model.into());
        self
    }

    /// Declares an HTTP provider.
    #[must_use]
    pub fn provider(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.draft.providers.insert(
            name.into(),
            Some(DraftProvider {
                transport: Transport::StreamableHttp.to_string(),
                url: url.into(),
                headers: IndexMap::new(),
                auth_from_context: false,
            }),
        );
        self
    }

    /// Adds a header to a previously declared provider.
    ///
    /// Ignored if the provider has not been declared.
    #[must_use]
    pub fn header(
        mut self,
        provider: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        if let Some(Some(p)) = self.draft.providers.get_mut(provider) {
            p.headers.insert(name.into(), value.into());
        }
        self
    }

    /// Marks a previously declared provider as drawing credentials from context.
    #[must_use]
    pub fn auth_from_context(mut self, provider: &str) -> Self {
        if let Some(Some(p)) = self.draft.providers.get_mut(provider) {
            p.auth_from_context = true;
        }
        self
    }

    /// Selects tools from a provider.
    #[must_use]
    pub fn tools<I, S>(mut self, provider: impl Into<String>, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.draft.tools.insert(
            provider.into(),
            Some(tools.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Sets the iteration ceiling.
    #[must_use]
    pub fn max_iterations(mut self, max_iterations: i64) -> Self {
        self.draft.max_iterations = Some(max_iterations);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.draft.temperature = Some(temperature);
        self
    }

    /// Sets the output length ceiling.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: i64) -> Self {
        self.draft.max_tokens = Some(max_tokens);
        self
    }

    /// Declares the execution sandbox.
    #[must_use]
    pub fn sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.draft.sandbox = Some(sandbox.to_value());
        self
    }

    /// Validates and builds the config.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every violated rule.
    pub fn build(self) -> Result<AgentConfig, ValidationError> {
        self.draft.validate(Vec::new())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draft + rules
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct DraftProvider {
    transport: String,
    url: String,
    #[serde(default)]
    headers: IndexMap<String, String>,
    #[serde(default)]
    auth_from_context: bool,
}

/// Input after shape checks, before rule checks.
///
/// Entries whose shape was wrong are kept as `None` so their names still take
/// part in the provider/tool correspondence check.
#[derive(Debug, Default)]
struct Draft {
    system_prompt: Option<String>,
    model: Option<String>,
    providers: IndexMap<String, Option<DraftProvider>>,
    tools: IndexMap<String, Option<Vec<String>>>,
    max_iterations: Option<i64>,
    temperature: Option<f64>,
    max_tokens: Option<i64>,
    sandbox: Option<Value>,
}

fn field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    keys: &[&str],
    violations: &mut Vec<String>,
) -> Option<T> {
    let (key, value) = keys
        .iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            violations.push(format!("{key}: {err}"));
            None
        }
    }
}

fn entries<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<String>,
) -> IndexMap<String, Option<T>> {
    let Some(section) = obj.get(key).filter(|v| !v.is_null()) else {
        return IndexMap::new();
    };
    let Some(section) = section.as_object() else {
        violations.push(format!("{key}: expected an object keyed by MCP server name"));
        return IndexMap::new();
    };
    section
        .iter()
        .map(|(name, value)| {
            let parsed = serde_json::from_value(value.clone())
                .map_err(|err| violations.push(format!("{key}.{name}: {err}")))
                .ok();
            (name.clone(), parsed)
        })
        .collect()
}

impl Draft {
    fn from_value(value: Value, violations: &mut Vec<String>) -> Self {
        let Value::Object(obj) = value else {
            violations.push("configuration must be a JSON object".to_string());
            return Self::default();
        };
        Self {
            system_prompt: field(&obj, &["system_prompt"], violations),
            model: field(&obj, &["model"], violations),
            providers: entries(&obj, "mcp_servers", violations),
            tools: entries(&obj, "mcp_tools", violations),
            max_iterations: field(&obj, &["max_iterations", "recursion_limit"], violations),
            temperature: field(&obj, &["temperature"], violations),
            max_tokens: field(&obj, &["max_tokens"], violations),
            sandbox: field(&obj, &["sandbox_config"], violations),
        }
    }

    fn validate(self, mut violations: Vec<String>) -> Result<AgentConfig, ValidationError> {
        let mut warnings = Vec::new();

        let system_prompt = self.system_prompt.unwrap_or_default();
        let trimmed = system_prompt.trim();
        if trimmed.is_empty() {
            violations.push("system_prompt: must not be empty".to_string());
        } else if trimmed.chars().count() < MIN_SYSTEM_PROMPT_LEN {
            violations.push(format!(
                "system_prompt: must be at least {MIN_SYSTEM_PROMPT_LEN} characters, got {}",
                trimmed.chars().count()
            ));
        }

        let model = self.model.unwrap_or_default();
        if model.trim().is_empty() {
            violations.push("model: must not be empty".to_string());
        }

        let max_iterations = match self.max_iterations {
            None => DEFAULT_MAX_ITERATIONS,
            Some(n) if n <= 0 => {
                violations.push(format!("max_iterations: must be a positive integer, got {n}"));
                DEFAULT_MAX_ITERATIONS
            }
            Some(n) => match u32::try_from(n) {
                Ok(n) => {
                    if n > MAX_ITERATIONS_WARN_THRESHOLD {
                        warnings.push(format!(
                            "max_iterations {n} is above {MAX_ITERATIONS_WARN_THRESHOLD}; \
                             a runaway reasoning loop will take a long time to stop"
                        ));
                    }
                    n
                }
                Err(_) => {
                    violations.push(format!("max_iterations: {n} is out of range"));
                    DEFAULT_MAX_ITERATIONS
                }
            },
        };

        if let Some(t) = self.temperature
            && !TEMPERATURE_RANGE.contains(&t)
        {
            violations.push(format!(
                "temperature: must be between {} and {}, got {t}",
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end()
            ));
        }

        let max_tokens = self.max_tokens.and_then(|n| match u32::try_from(n) {
            Ok(n) if n > 0 => Some(n),
            _ => {
                violations.push(format!("max_tokens: must be a positive integer, got {n}"));
                None
            }
        });

        let sandbox = self
            .sandbox
            .and_then(|raw| check_sandbox(raw, &mut violations));

        check_correspondence(&self.providers, &self.tools, &mut violations);

        let mut providers = IndexMap::with_capacity(self.providers.len());
        for (name, provider) in self.providers {
            if !is_identifier(&name) {
                violations.push(format!(
                    "mcp_servers: server name '{name}' must start with a letter or underscore \
                     and contain only letters, digits, '_' or '-'"
                ));
            }
            let Some(provider) = provider else { continue };
            if let Some(provider) = check_provider(&name, provider, &mut violations, &mut warnings) {
                providers.insert(name, provider);
            }
        }

        let mut tools = IndexMap::with_capacity(self.tools.len());
        for (name, selection) in self.tools {
            let Some(selection) = selection else { continue };
            check_tool_selection(&name, &selection, &mut violations);
            tools.insert(name, selection);
        }

        if !violations.is_empty() {
            return Err(ValidationError::new(violations));
        }

        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        Ok(AgentConfig {
            system_prompt,
            model,
            providers,
            tools,
            max_iterations,
            temperature: self.temperature,
            max_tokens,
            sandbox,
            warnings,
        })
    }
}

fn check_correspondence<A, B>(
    providers: &IndexMap<String, A>,
    tools: &IndexMap<String, B>,
    violations: &mut Vec<String>,
) {
    let without_tools: Vec<&str> = providers
        .keys()
        .filter(|name| !tools.contains_key(*name))
        .map(String::as_str)
        .collect();
    let without_server: Vec<&str> = tools
        .keys()
        .filter(|name| !providers.contains_key(*name))
        .map(String::as_str)
        .collect();

    if !without_tools.is_empty() {
        violations.push(format!(
            "mcp_servers declared without an mcp_tools entry: {}",
            without_tools.join(", ")
        ));
    }
    if !without_server.is_empty() {
        violations.push(format!(
            "mcp_tools reference undeclared mcp_servers: {}",
            without_server.join(", ")
        ));
    }
}

fn check_provider(
    name: &str,
    raw: DraftProvider,
    violations: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> Option<ProviderConfig> {
    let before = violations.len();

    let transport = Transport::parse(&raw.transport);
    if transport.is_none() {
        violations.push(format!(
            "mcp_servers.{name}.transport: unsupported transport '{}', expected 'http'",
            raw.transport
        ));
    }

    if let Err(reason) = check_endpoint(&raw.url) {
        violations.push(format!("mcp_servers.{name}.url: {reason}"));
    }

    if raw.headers.keys().any(|k| k.trim().is_empty()) {
        violations.push(format!("mcp_servers.{name}.headers: header names must not be empty"));
    }

    if violations.len() > before {
        return None;
    }

    let provider = ProviderConfig::new(
        transport.unwrap_or_default(),
        raw.url,
        raw.headers,
        raw.auth_from_context,
    );
    if provider.auth_from_context && provider.mode == ProvisioningMode::Static {
        warnings.push(format!(
            "mcp_servers.{name} sets auth_from_context but references no placeholders; \
             its credentials are fixed"
        ));
    }
    Some(provider)
}

fn check_tool_selection(provider: &str, selection: &[String], violations: &mut Vec<String>) {
    if selection.is_empty() {
        violations.push(format!("mcp_tools.{provider}: must select at least one tool"));
        return;
    }

    let mut seen = HashSet::with_capacity(selection.len());
    let mut duplicates = Vec::new();
    for tool in selection {
        if !is_identifier(tool) {
            violations.push(format!("mcp_tools.{provider}: invalid tool name '{tool}'"));
        }
        if !seen.insert(tool.as_str()) && !duplicates.contains(&tool.as_str()) {
            duplicates.push(tool.as_str());
        }
    }
    if !duplicates.is_empty() {
        violations.push(format!(
            "mcp_tools.{provider}: duplicate tool names: {}",
            duplicates.join(", ")
        ));
    }
}

fn check_sandbox(raw: Value, violations: &mut Vec<String>) -> Option<SandboxConfig> {
    let Value::Object(obj) = raw else {
        violations.push(format!(
            "sandbox_config: must be an object; supported types: {SANDBOX_TYPES}"
        ));
        return None;
    };
    let Some(kind) = obj
        .get("type")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
    else {
        violations.push(format!(
            "sandbox_config: must include a 'type' key; supported types: {SANDBOX_TYPES}"
        ));
        return None;
    };

    match kind {
        "filesystem" => match obj.get("root_dir") {
            None | Some(Value::Null) => Some(SandboxConfig::filesystem(DEFAULT_SANDBOX_ROOT)),
            Some(Value::String(dir)) if !dir.trim().is_empty() => {
                Some(SandboxConfig::filesystem(dir.as_str()))
            }
            Some(_) => {
                violations.push("sandbox_config.root_dir: must be a non-empty string".to_string());
                None
            }
        },
        "modal" | "runloop" | "daytona" | "harbor" => {
            violations.push(format!(
                "sandbox_config.type: '{kind}' sandboxes are not available yet; \
                 use 'filesystem' for local execution"
            ));
            None
        }
        other => {
            violations.push(format!(
                "sandbox_config.type: unsupported sandbox type '{other}'; \
                 supported types: {SANDBOX_TYPES}"
            ));
            None
        }
    }
}

/// Letters, digits, `_`, `-`; not starting with a digit or `-`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Requires `https`, or `http` to a loopback host.
///
/// Headers travel with every request, so plaintext to a remote host would
/// expose credentials, including ones substituted at invocation time.
fn check_endpoint(url: &str) -> Result<(), String> {
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(format!("'{url}' is not an absolute URL"));
    };
    let authority = authority_of(rest);
    let host = host_of(authority);
    if host.is_empty() {
        return Err(format!("'{url}' has no host"));
    }

    if scheme.eq_ignore_ascii_case("https") {
        Ok(())
    } else if scheme.eq_ignore_ascii_case("http") {
        if template::str_has_placeholder(authority) {
            Err("unencrypted http endpoints must not use placeholders in the host, port \
                 or credentials; use https"
                .to_string())
        } else if is_loopback(host) {
            Ok(())
        } else {
            Err(format!(
                "unencrypted http is only allowed for localhost, got host '{host}'; use https"
            ))
        }
    } else {
        Err(format!("unsupported scheme '{scheme}', expected https"))
    }
}

fn authority_of(rest: &str) -> &str {
    rest.split(['/', '?', '#']).next().unwrap_or_default()
}

fn host_of(authority: &str) -> &str {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    if let Some(bracketed) = host_port.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or_default();
    }
    host_port.split(':').next().unwrap_or_default()
}

fn is_loopback(host: &str) -> bool {
    if template::str_has_placeholder(host) {
        return false;
    }
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}
