//! Error types for configuration and tool provisioning.
//!
//! Errors fall into three groups:
//!
//! - [`ValidationError`]: static configuration mistakes, reported once when an
//!   [`AgentConfig`](crate::AgentConfig) is built, with every violation listed.
//! - [`MissingBindingError`], [`ResolveError`] and the binding variants of
//!   [`ProvisionError`]:
//!   per-invocation mistakes that abort only that invocation.
//! - [`ConnectionError`]: transport failures from the remote provider,
//!   propagated unchanged and never retried here.

use std::path::PathBuf;

/// Boxed error source carried by [`ConnectionError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// ValidationError
// ─────────────────────────────────────────────────────────────────────────────

/// A configuration was rejected.
///
/// Carries one message per violated rule, in the order the rules were checked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid agent configuration ({} violation{}):\n  - {}",
    .violations.len(),
    if .violations.len() == 1 { "" } else { "s" },
    .violations.join("\n  - "))]
pub struct ValidationError {
    violations: Vec<String>,
}

impl ValidationError {
    /// Creates an error from a non-empty list of violations.
    #[must_use]
    pub fn new(violations: Vec<String>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    /// Returns the individual violation messages.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Returns `true` if any violation message contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations.iter().any(|v| v.contains(needle))
    }
}

/// Failure loading an agent configuration from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed but the configuration is invalid.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

// ─────────────────────────────────────────────────────────────────────────────
// MissingBindingError
// ─────────────────────────────────────────────────────────────────────────────

/// Placeholders were referenced that have no binding.
///
/// Lists every missing name, sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing binding{} for placeholder{}: {}",
    if .names.len() == 1 { "" } else { "s" },
    if .names.len() == 1 { "" } else { "s" },
    .names.join(", "))]
pub struct MissingBindingError {
    names: Vec<String>,
}

impl MissingBindingError {
    /// Creates an error for the given placeholder names.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    /// Returns the missing placeholder names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResolveError
// ─────────────────────────────────────────────────────────────────────────────

/// Failure to turn a provider declaration into connection parameters.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Some placeholders have no binding.
    #[error(transparent)]
    MissingBinding(#[from] MissingBindingError),

    /// The substituted url is not https and not plain http to a loopback host.
    ///
    /// The resolved url is not echoed; substituted values may be secrets.
    #[error("resolved url must use https, or plain http to a loopback host")]
    InsecureEndpoint,
}

// ─────────────────────────────────────────────────────────────────────────────
// ConnectionError
// ─────────────────────────────────────────────────────────────────────────────

/// A transport failure reported by a provider connection.
#[derive(Debug, thiserror::Error)]
#[error("connection error: {message}")]
pub struct ConnectionError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ConnectionError {
    /// Creates an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProvisionError
// ─────────────────────────────────────────────────────────────────────────────

/// Failure of the invocation entry hook.
///
/// Any of these aborts the invocation before a reasoning step runs; no tool
/// is published when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// A provider needs per-invocation values but the invocation carried none.
    #[error(
        "MCP server '{provider}' uses placeholders but the invocation supplied no substitution context"
    )]
    ConfigurationMissing {
        /// Provider that required the context.
        provider: String,
    },

    /// Placeholders referenced by one or more providers have no binding.
    #[error("MCP server{} '{}': {source}",
        if .providers.len() == 1 { "" } else { "s" },
        .providers.join("', '"))]
    MissingBinding {
        /// Providers whose parameters could not be resolved, in declaration order.
        providers: Vec<String>,
        /// Every missing name across those providers.
        #[source]
        source: MissingBindingError,
    },

    /// Substituted values moved the endpoint off https and loopback.
    #[error("MCP server '{provider}': {source}")]
    InsecureEndpoint {
        /// Provider whose resolved url was refused.
        provider: String,
        /// The rejection.
        #[source]
        source: ResolveError,
    },

    /// A declared tool is not offered by the provider.
    #[error("tool '{tool}' not found on MCP server '{provider}'")]
    ToolNotFound {
        /// Provider that was queried.
        provider: String,
        /// The declared tool name that is absent.
        tool: String,
    },

    /// The provider connection or tool listing failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl ProvisionError {
    /// Returns the provider this error concerns, when known.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ConfigurationMissing { provider }
            | Self::InsecureEndpoint { provider, .. }
            | Self::ToolNotFound { provider, .. } => Some(provider),
            Self::MissingBinding { providers, .. } => providers.first().map(String::as_str),
            Self::Connection(_) => None,
        }
    }

    /// Returns `true` for transport failures, `false` for configuration mistakes.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = ValidationError::new(vec!["first".into(), "second".into()]);
        let text = err.to_string();
        assert!(text.contains("2 violations"));
        assert!(text.contains("- first"));
        assert!(text.contains("- second"));
        assert!(err.mentions("sec"));
    }

    #[test]
    fn missing_binding_names_are_sorted_and_unique() {
        let err = MissingBindingError::new(["TOKEN", "ORG", "TOKEN"]);
        assert_eq!(err.names(), ["ORG", "TOKEN"]);
        assert_eq!(
            err.to_string(),
            "missing bindings for placeholders: ORG, TOKEN"
        );
    }

    #[test]
    fn provision_error_exposes_provider() {
        let err = ProvisionError::MissingBinding {
            providers: vec!["github".into()],
            source: MissingBindingError::new(["TOKEN"]),
        };
        assert_eq!(err.provider(), Some("github"));
        assert!(!err.is_transient());
        assert_eq!(
            err.to_string(),
            "MCP server 'github': missing binding for placeholder: TOKEN"
        );

        let err = ProvisionError::MissingBinding {
            providers: vec!["a".into(), "b".into()],
            source: MissingBindingError::new(["TOKEN_B", "TOKEN_A"]),
        };
        assert_eq!(err.provider(), Some("a"));
        assert_eq!(
            err.to_string(),
            "MCP servers 'a', 'b': missing bindings for placeholders: TOKEN_A, TOKEN_B"
        );

        let err = ProvisionError::InsecureEndpoint {
            provider: "local".into(),
            source: ResolveError::InsecureEndpoint,
        };
        assert_eq!(err.provider(), Some("local"));
        assert!(err.to_string().starts_with("MCP server 'local': resolved url"));

        let err = ProvisionError::from(ConnectionError::new("refused"));
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "connection error: refused");
    }
}
