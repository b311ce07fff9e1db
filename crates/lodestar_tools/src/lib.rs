//! Tool handles for Lodestar agents.
//!
//! This crate provides the shape of a callable tool and the collection that a
//! reasoning loop reads its tools from during one invocation. Tools here are
//! usually backed by a remote provider, but anything implementing [`Tool`]
//! can be registered.
//!
//! # Architecture
//!
//! - [`Tool`]: trait for executable tools with a JSON schema
//! - [`ToolDefinition`]: the LLM-facing name, description, and schema
//! - [`ToolRegistry`]: flat, deduplicated, name-addressed tool collection
//! - [`ToolError`]: failures during tool execution

pub mod error;
pub mod registry;
pub mod tool;

// Re-export core types at crate root.
pub use error::ToolError;
pub use registry::{Insertion, ToolRegistry};
pub use tool::{Tool, ToolDefinition, ToolFuture};
