//! Execution-engine boundary.
//!
//! This layer describes builds; it never runs them. An [`ExecutionEngine`]
//! is the external collaborator that owns scheduling, caching, and file
//! timestamps. The contract here is deliberately small: construct nodes
//! from fully-populated environments, accept dependency edges between
//! already-constructed nodes, and terminate the run.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod env;
pub mod recording;

pub use env::{BuildEnv, FlagGroup, SourceList, SourceRef};
pub use recording::{GraphRecorder, NodeKind, NodeSpec};

/// Opaque handle to a node constructed by the execution engine.
///
/// Node ids only exist after submission; dependency edges are declared in
/// terms of them, which is why `depends_on` requires submitted endpoints.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node id. Engines issue these; callers only pass them around.
    pub fn new(raw: u64) -> Self {
        NodeId(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Handler for a custom build step: `(target, source paths) -> result`.
///
/// The engine invokes the handler when the step runs; a returned error must
/// abort the run.
pub type CustomHandler = Box<dyn Fn(&Path, &[PathBuf]) -> Result<()> + Send>;

/// A custom build step registration.
pub struct CustomStep {
    /// Step name, used for engine-side registration and diagnostics.
    pub name: String,
    /// The artifact the step produces.
    pub target: PathBuf,
    /// Inputs the step reads.
    pub sources: SourceList,
    /// The function that performs the step.
    pub handler: CustomHandler,
}

impl fmt::Debug for CustomStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomStep")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// The prerequisite side of a dependency edge.
#[derive(Debug, Clone)]
pub enum DependencyInput {
    /// Previously constructed nodes.
    Nodes(Vec<NodeId>),
    /// Raw artifact paths (the engine interns them as file nodes).
    Artifacts(Vec<PathBuf>),
    /// A mixed input list, as accumulated on a toolset.
    Sources(SourceList),
}

/// The build-execution engine this layer hands its graph to.
///
/// Node construction receives the action's fully-populated [`BuildEnv`];
/// the engine owns everything after that point. All methods are fallible:
/// a rejected request is fatal to the enclosing submission.
pub trait ExecutionEngine {
    /// Construct one object node per source in the environment.
    fn objects(&mut self, env: &BuildEnv) -> Result<Vec<NodeId>>;

    /// Construct a static-library node.
    fn static_library(&mut self, env: &BuildEnv, target: &Path) -> Result<Vec<NodeId>>;

    /// Construct a shared-library node.
    fn shared_library(&mut self, env: &BuildEnv, target: &Path) -> Result<Vec<NodeId>>;

    /// Construct an executable node.
    fn program(&mut self, env: &BuildEnv, target: &Path) -> Result<Vec<NodeId>>;

    /// Register a custom step backed by an external handler.
    fn custom(&mut self, env: &BuildEnv, step: CustomStep) -> Result<Vec<NodeId>>;

    /// Declare that `nodes` must not run before `on` is current.
    ///
    /// Both sides must already be constructed; there is no deferred or
    /// symbolic edge representation.
    fn depends(&mut self, nodes: &[NodeId], on: &DependencyInput) -> Result<()>;

    /// Terminate the whole run with the given process exit code.
    fn exit(&mut self, code: i32);
}
