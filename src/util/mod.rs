//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod process;

pub use config::{resolve_backend, BackendConfig};
pub use diagnostic::Diagnostic;
