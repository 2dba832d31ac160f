//! Slipway - a build-description layer for C/C++ solutions.
//!
//! Callers describe a tree of projects carrying compiler toolsets, attach
//! build actions (object compilation, library and executable linking,
//! custom steps) with explicit dependency edges, and hand the resulting
//! graph to an external execution engine. Slipway translates abstract,
//! compiler-independent options into the concrete flags of a backend
//! family (gcc, clang, clang-cl, msvc) and orchestrates the Windows
//! export-all-symbols pipeline; scheduling, caching, and file I/O belong
//! to the engine.

pub mod actions;
pub mod core;
pub mod engine;
pub mod errors;
pub mod exports;
pub mod sources;
pub mod util;

/// Test fixtures for slipway unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use crate::actions::{ActionInputs, DependsOn, SharedLibraryOptions, ToolsetRef};
pub use crate::core::{
    ActionId, Backend, ProjectId, Solution, Toolset,
};
pub use crate::engine::{
    BuildEnv, ExecutionEngine, FlagGroup, GraphRecorder, NodeId, SourceList, SourceRef,
};
pub use crate::errors::BuildError;
