//! The per-invocation tool registry.
//!
//! A [`ToolRegistry`] is the capability surface a reasoning loop reads from:
//! a flat collection of tools addressed by name. Unlike a build-time
//! registry, inserting a tool never panics. Re-inserting the same tool
//! (same origin, same name) is a no-op, and a name already claimed by a
//! tool from a different origin is reported back to the caller.

use crate::error::ToolError;
use crate::tool::{Tool, ToolDefinition};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Outcome of [`ToolRegistry::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// The tool was added.
    Added,
    /// The same tool was already present; nothing changed.
    Duplicate,
    /// Another tool already owns this name; the new tool was not added.
    Conflict {
        /// Origin of the tool that keeps the name.
        existing_origin: Option<String>,
    },
}

/// Registry of tools available to one invocation.
///
/// Preserves insertion order, so tool definitions are offered to the model in
/// the order they were declared.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl core::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Inserts a shared tool handle.
    pub fn insert(&mut self, tool: Arc<dyn Tool>) -> Insertion {
        let name = tool.definition().name;
        match self.tools.get(&name) {
            Some(existing) if existing.origin() == tool.origin() => Insertion::Duplicate,
            Some(existing) => Insertion::Conflict {
                existing_origin: existing.origin().map(str::to_owned),
            },
            None => {
                self.tools.insert(name, tool);
                Insertion::Added
            }
        }
    }

    /// Inserts an owned tool.
    pub fn register(&mut self, tool: impl Tool) -> Insertion {
        self.insert(Arc::new(tool))
    }

    /// Executes a tool by name with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] if no tool has this name, or the
    /// tool's own error if execution fails.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::unknown_tool(name))?;
        tool.execute(args).await
    }

    /// Returns tool definitions for all registered tools.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Returns a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns whether a tool with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the names of all registered tools.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Iterates over the registered tools in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }
}
