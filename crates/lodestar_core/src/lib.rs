//! Ambient infrastructure shared by Lodestar binaries.
//!
//! Libraries in the workspace only emit `tracing` events; installing a
//! subscriber is left to the binary, which does it through [`TracingConfig`].

pub mod logging;

pub use logging::{ParseFormatError, TracingConfig, TracingFormat};
