//! Declarative MCP tool provisioning for agent reasoning loops.
//!
//! Facade over the `lodestar_*` crates. Most callers only need [`prelude`].

pub use lodestar_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use lodestar_internal::prelude::*;
}
