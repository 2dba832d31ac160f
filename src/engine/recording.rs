//! Reference engine that records node and edge requests.
//!
//! `GraphRecorder` implements [`ExecutionEngine`] against an in-memory
//! petgraph digraph. It performs no I/O scheduling; it exists so embedders
//! and tests can inspect exactly what this layer hands an engine, and so
//! the recorded graph can be snapshotted to JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::env::{BuildEnv, SourceRef};
use super::{CustomStep, DependencyInput, ExecutionEngine, NodeId};

/// The kind of a recorded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Object,
    StaticLibrary,
    SharedLibrary,
    Program,
    Custom,
    /// A raw file interned as a graph node when used as an edge endpoint.
    Artifact,
}

/// A recorded node-construction request.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSpec {
    pub kind: NodeKind,
    /// Output path, where the request named one.
    pub target: Option<PathBuf>,
    /// The single source this node consumes (object and artifact nodes).
    pub source: Option<SourceRef>,
    /// Snapshot of the environment at construction time.
    pub env: Option<BuildEnv>,
}

/// Serializable snapshot of the recorded graph.
#[derive(Debug, Serialize)]
struct GraphSnapshot<'a> {
    nodes: Vec<(u64, &'a NodeSpec)>,
    edges: Vec<(u64, u64)>,
}

/// In-memory recording engine.
#[derive(Default)]
pub struct GraphRecorder {
    graph: DiGraph<NodeSpec, ()>,
    handlers: HashMap<NodeId, super::CustomHandler>,
    artifacts: HashMap<PathBuf, NodeId>,
    exit_code: Option<i32>,
}

impl GraphRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        GraphRecorder::default()
    }

    fn push(&mut self, spec: NodeSpec) -> NodeId {
        let idx = self.graph.add_node(spec);
        NodeId::new(idx.index() as u64)
    }

    fn index(&self, id: NodeId) -> Result<NodeIndex> {
        let idx = NodeIndex::new(id.raw() as usize);
        if self.graph.node_weight(idx).is_none() {
            bail!("unknown node {}", id);
        }
        Ok(idx)
    }

    fn artifact_node(&mut self, path: &Path) -> NodeId {
        if let Some(id) = self.artifacts.get(path) {
            return *id;
        }
        let id = self.push(NodeSpec {
            kind: NodeKind::Artifact,
            target: Some(path.to_path_buf()),
            source: Some(SourceRef::Path(path.to_path_buf())),
            env: None,
        });
        self.artifacts.insert(path.to_path_buf(), id);
        id
    }

    /// Look up a recorded node.
    pub fn node(&self, id: NodeId) -> Option<&NodeSpec> {
        self.graph.node_weight(NodeIndex::new(id.raw() as usize))
    }

    /// Total number of recorded nodes (artifact nodes included).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The prerequisites declared for a node, in declaration order.
    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        let idx = NodeIndex::new(id.raw() as usize);
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .map(|n| NodeId::new(n.index() as u64))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    /// Whether an edge `node -> on` was declared.
    pub fn depends_directly(&self, node: NodeId, on: NodeId) -> bool {
        let a = NodeIndex::new(node.raw() as usize);
        let b = NodeIndex::new(on.raw() as usize);
        self.graph.contains_edge(a, b)
    }

    /// The exit code recorded via [`ExecutionEngine::exit`], if any.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Invoke a recorded custom step's handler now.
    ///
    /// Node-valued sources resolve to the referenced node's target path;
    /// engines that schedule for real do the same materialization.
    pub fn run_custom(&self, id: NodeId) -> Result<()> {
        let spec = self
            .node(id)
            .with_context(|| format!("unknown node {}", id))?;
        let handler = self
            .handlers
            .get(&id)
            .with_context(|| format!("node {} is not a custom step", id))?;

        let target = spec
            .target
            .clone()
            .with_context(|| format!("custom node {} has no target", id))?;

        let mut paths = Vec::new();
        if let Some(env) = &spec.env {
            for source in env.sources().items() {
                match source {
                    SourceRef::Path(p) => paths.push(p.clone()),
                    SourceRef::Node(n) => {
                        let referenced = self
                            .node(*n)
                            .with_context(|| format!("dangling source node {}", n))?;
                        if let Some(out) = referenced.target.clone() {
                            paths.push(out);
                        } else if let Some(SourceRef::Path(p)) = &referenced.source {
                            paths.push(p.clone());
                        }
                    }
                }
            }
        }

        handler(&target, &paths)
    }

    /// Write the recorded graph as JSON, for inspection and tooling.
    pub fn write_graph_json(&self, path: &Path) -> Result<()> {
        let snapshot = GraphSnapshot {
            nodes: self
                .graph
                .node_indices()
                .map(|i| (i.index() as u64, &self.graph[i]))
                .collect(),
            edges: self
                .graph
                .edge_indices()
                .filter_map(|e| self.graph.edge_endpoints(e))
                .map(|(a, b)| (a.index() as u64, b.index() as u64))
                .collect(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write graph snapshot: {}", path.display()))?;
        Ok(())
    }

    fn single(&mut self, kind: NodeKind, env: &BuildEnv, target: &Path) -> Vec<NodeId> {
        vec![self.push(NodeSpec {
            kind,
            target: Some(target.to_path_buf()),
            source: None,
            env: Some(env.clone()),
        })]
    }
}

impl ExecutionEngine for GraphRecorder {
    fn objects(&mut self, env: &BuildEnv) -> Result<Vec<NodeId>> {
        // one node per accumulated source, mirroring per-translation-unit builds
        let sources: Vec<SourceRef> = env.sources().items().to_vec();
        let ids = sources
            .into_iter()
            .map(|source| {
                self.push(NodeSpec {
                    kind: NodeKind::Object,
                    target: None,
                    source: Some(source),
                    env: Some(env.clone()),
                })
            })
            .collect();
        Ok(ids)
    }

    fn static_library(&mut self, env: &BuildEnv, target: &Path) -> Result<Vec<NodeId>> {
        Ok(self.single(NodeKind::StaticLibrary, env, target))
    }

    fn shared_library(&mut self, env: &BuildEnv, target: &Path) -> Result<Vec<NodeId>> {
        Ok(self.single(NodeKind::SharedLibrary, env, target))
    }

    fn program(&mut self, env: &BuildEnv, target: &Path) -> Result<Vec<NodeId>> {
        Ok(self.single(NodeKind::Program, env, target))
    }

    fn custom(&mut self, env: &BuildEnv, step: CustomStep) -> Result<Vec<NodeId>> {
        let mut env = env.clone();
        env.add_sources(&step.sources);

        let id = self.push(NodeSpec {
            kind: NodeKind::Custom,
            target: Some(step.target.clone()),
            source: None,
            env: Some(env),
        });
        self.handlers.insert(id, step.handler);

        tracing::debug!(step = %step.name, node = %id, "registered custom step");
        Ok(vec![id])
    }

    fn depends(&mut self, nodes: &[NodeId], on: &DependencyInput) -> Result<()> {
        let prerequisites: Vec<NodeId> = match on {
            DependencyInput::Nodes(ids) => {
                for id in ids {
                    self.index(*id)?;
                }
                ids.clone()
            }
            DependencyInput::Artifacts(paths) => {
                paths.iter().map(|p| self.artifact_node(p)).collect()
            }
            DependencyInput::Sources(list) => {
                let mut ids = Vec::new();
                for source in list.items() {
                    match source {
                        SourceRef::Path(p) => ids.push(self.artifact_node(p)),
                        SourceRef::Node(n) => {
                            self.index(*n)?;
                            ids.push(*n);
                        }
                    }
                }
                ids
            }
        };

        for node in nodes {
            let from = self.index(*node)?;
            for dep in &prerequisites {
                let to = self.index(*dep)?;
                self.graph.update_edge(from, to, ());
            }
        }
        Ok(())
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::env::SourceList;

    #[test]
    fn test_objects_one_node_per_source() {
        let mut recorder = GraphRecorder::new();
        let mut env = BuildEnv::new();
        let mut sources = SourceList::new();
        sources.extend(["a.cpp", "b.cpp", "c.cpp"]);
        env.add_sources(&sources);

        let nodes = recorder.objects(&env).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(recorder.node(nodes[0]).unwrap().kind, NodeKind::Object);
    }

    #[test]
    fn test_depends_on_nodes_and_artifacts() {
        let mut recorder = GraphRecorder::new();
        let env = BuildEnv::new();

        let lib = recorder
            .shared_library(&env, Path::new("out/libx.so"))
            .unwrap();
        let objs = {
            let mut env = BuildEnv::new();
            let mut sources = SourceList::new();
            sources.push("x.cpp");
            env.add_sources(&sources);
            recorder.objects(&env).unwrap()
        };

        recorder
            .depends(&lib, &DependencyInput::Nodes(objs.clone()))
            .unwrap();
        recorder
            .depends(
                &lib,
                &DependencyInput::Artifacts(vec![PathBuf::from("x.def")]),
            )
            .unwrap();

        assert!(recorder.depends_directly(lib[0], objs[0]));
        assert_eq!(recorder.dependencies_of(lib[0]).len(), 2);
    }

    #[test]
    fn test_depends_on_unknown_node_fails() {
        let mut recorder = GraphRecorder::new();
        let env = BuildEnv::new();
        let lib = recorder.program(&env, Path::new("out/app")).unwrap();

        let result = recorder.depends(
            &lib,
            &DependencyInput::Nodes(vec![NodeId::new(999)]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_artifact_nodes_are_interned() {
        let mut recorder = GraphRecorder::new();
        let env = BuildEnv::new();
        let a = recorder.program(&env, Path::new("out/a")).unwrap();
        let b = recorder.program(&env, Path::new("out/b")).unwrap();

        let dep = DependencyInput::Artifacts(vec![PathBuf::from("shared.h")]);
        recorder.depends(&a, &dep).unwrap();
        recorder.depends(&b, &dep).unwrap();

        // two programs + one interned artifact
        assert_eq!(recorder.node_count(), 3);
    }

    #[test]
    fn test_exit_code_recorded() {
        let mut recorder = GraphRecorder::new();
        recorder.exit(2);
        assert_eq!(recorder.exit_code(), Some(2));
    }

    #[test]
    fn test_graph_json_snapshot() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut recorder = GraphRecorder::new();
        let env = BuildEnv::new();
        let prog = recorder.program(&env, Path::new("out/app")).unwrap();
        recorder
            .depends(
                &prog,
                &DependencyInput::Artifacts(vec![PathBuf::from("main.c")]),
            )
            .unwrap();

        let path = tmp.path().join("graph.json");
        recorder.write_graph_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"program\""));
        assert!(text.contains("\"artifact\""));
        assert!(text.contains("main.c"));
    }
}
