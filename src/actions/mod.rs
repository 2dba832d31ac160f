//! Build actions and the dependency graph lifecycle.
//!
//! An action owns a private clone of its scope's environment plus a resolved
//! toolset. Lifecycle is `Created -> Submitted`: submission applies the
//! toolset to the environment in one pass, asks the engine to construct the
//! node(s), and records the returned ids. Dependency edges are declared
//! against those ids, which is why both endpoints must be submitted first.

pub mod custom;
pub mod object;
pub mod program;
pub mod shared_lib;
pub mod static_lib;

use std::path::PathBuf;

use crate::core::scope::{ActionId, ProjectId, Solution};
use crate::core::toolset::Toolset;
use crate::engine::env::{BuildEnv, SourceList};
use crate::engine::{CustomStep, DependencyInput, ExecutionEngine, NodeId};
use crate::errors::BuildError;

pub use custom::CustomSpec;
pub use object::ObjectsSpec;
pub use program::ProgramSpec;
pub use shared_lib::{SharedLibraryOptions, SharedLibrarySpec};
pub use static_lib::StaticLibrarySpec;

/// A toolset argument: a name resolved through the scope chain, or an
/// inline instance.
#[derive(Debug, Clone)]
pub enum ToolsetRef {
    Named(String),
    Inline(Toolset),
}

impl From<&str> for ToolsetRef {
    fn from(name: &str) -> Self {
        ToolsetRef::Named(name.to_string())
    }
}

impl From<String> for ToolsetRef {
    fn from(name: String) -> Self {
        ToolsetRef::Named(name)
    }
}

impl From<Toolset> for ToolsetRef {
    fn from(toolset: Toolset) -> Self {
        ToolsetRef::Inline(toolset)
    }
}

/// Optional inputs accepted by the thin action constructors; each list is
/// forwarded onto the action's toolset.
#[derive(Debug, Default)]
pub struct ActionInputs {
    pub sources: SourceList,
    pub include_paths: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub library_paths: Vec<PathBuf>,
}

/// The prerequisite side of [`Solution::add_dependency`].
#[derive(Debug)]
pub enum DependsOn {
    /// Another action, unwrapped to its submitted nodes.
    Action(ActionId),
    /// A raw engine node.
    Node(NodeId),
    /// Several raw engine nodes.
    Nodes(Vec<NodeId>),
    /// Artifact paths.
    Artifacts(Vec<PathBuf>),
    /// A mixed source list, as accumulated on a toolset.
    Sources(SourceList),
}

pub(crate) enum ActionKind {
    Objects(ObjectsSpec),
    StaticLibrary(StaticLibrarySpec),
    SharedLibrary(SharedLibrarySpec),
    Program(ProgramSpec),
    Custom(CustomSpec),
}

pub(crate) struct ActionData {
    pub(crate) label: String,
    pub(crate) project: ProjectId,
    pub(crate) env: BuildEnv,
    pub(crate) toolset: Option<Toolset>,
    pub(crate) kind: ActionKind,
    pub(crate) submitted: Option<Vec<NodeId>>,
}

impl ActionData {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self.kind {
            ActionKind::Objects(_) => "objects",
            ActionKind::StaticLibrary(_) => "static-library",
            ActionKind::SharedLibrary(_) => "shared-library",
            ActionKind::Program(_) => "program",
            ActionKind::Custom(_) => "custom",
        }
    }
}

impl std::fmt::Debug for ActionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionData")
            .field("label", &self.label)
            .field("kind", &self.kind_name())
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl Solution {
    /// Resolve a toolset reference for a project, cloning the registration.
    pub(crate) fn resolve_toolset(
        &self,
        project: ProjectId,
        toolset: ToolsetRef,
    ) -> Result<Toolset, BuildError> {
        match toolset {
            ToolsetRef::Inline(toolset) => Ok(toolset),
            ToolsetRef::Named(name) => self
                .find_toolset(project, &name)
                .cloned()
                .ok_or_else(|| BuildError::ToolsetNotFound {
                    toolset: name,
                    project: self.project_name(project).to_string(),
                }),
        }
    }

    /// Clone a project's environment and attach a new action to it.
    pub(crate) fn new_action(
        &mut self,
        project: ProjectId,
        label: String,
        toolset: Option<Toolset>,
        kind: ActionKind,
    ) -> ActionId {
        let env = self.scopes[project.0].env.clone();
        self.attach_action(
            project,
            ActionData {
                label,
                project,
                env,
                toolset,
                kind,
                submitted: None,
            },
        )
    }

    /// Submit every attached action in declaration order, recursing through
    /// child projects. No parallelism: ordering is caller-declared, and real
    /// scheduling belongs to the engine once edges are in place.
    pub fn submit<E: ExecutionEngine>(&mut self, engine: &mut E) -> Result<(), BuildError> {
        tracing::info!(solution = %self.project_name(self.root()), "submitting solution");
        for id in self.submission_order() {
            self.submit_action(id, engine)?;
        }
        Ok(())
    }

    /// Submit a single action. Post-condition on success: the action's
    /// submitted nodes are recorded and edge declarations may target it.
    pub fn submit_action<E: ExecutionEngine>(
        &mut self,
        id: ActionId,
        engine: &mut E,
    ) -> Result<(), BuildError> {
        if self.actions[id.0].submitted.is_some() {
            return Err(BuildError::AlreadySubmitted {
                action: self.actions[id.0].label.clone(),
            });
        }

        let output_base = self
            .project_output_path(self.actions[id.0].project)
            .to_path_buf();

        let action = &mut self.actions[id.0];
        if let Some(toolset) = &action.toolset {
            toolset.apply_to(&mut action.env)?;
        }

        let ActionData {
            env,
            toolset,
            kind,
            label,
            ..
        } = action;

        let nodes = match kind {
            ActionKind::Objects(_) => engine.objects(env).map_err(BuildError::Engine)?,
            ActionKind::StaticLibrary(spec) => {
                let target = output_base.join(&spec.output_dir).join(&spec.target);
                engine
                    .static_library(env, &target)
                    .map_err(BuildError::Engine)?
            }
            ActionKind::Program(spec) => {
                let target = output_base.join(&spec.output_dir).join(&spec.target);
                engine.program(env, &target).map_err(BuildError::Engine)?
            }
            ActionKind::SharedLibrary(spec) => {
                shared_lib::submit_shared_library(engine, env, toolset.as_ref(), spec, &output_base)?
            }
            ActionKind::Custom(spec) => {
                let handler =
                    spec.handler
                        .take()
                        .ok_or_else(|| BuildError::AlreadySubmitted {
                            action: label.clone(),
                        })?;
                engine
                    .custom(
                        env,
                        CustomStep {
                            name: spec.step_name.clone(),
                            target: spec.target.clone(),
                            sources: spec.sources.clone(),
                            handler,
                        },
                    )
                    .map_err(BuildError::Engine)?
            }
        };

        tracing::debug!(action = %label, nodes = nodes.len(), "action submitted");
        self.actions[id.0].submitted = Some(nodes);
        Ok(())
    }

    /// Declare that `action` must not run before `on` is current.
    ///
    /// Both endpoints must already be submitted: edges are expressed
    /// directly against engine node ids, which only exist post-submission.
    pub fn add_dependency<E: ExecutionEngine>(
        &mut self,
        engine: &mut E,
        action: ActionId,
        on: DependsOn,
    ) -> Result<(), BuildError> {
        let nodes = self.actions[action.0]
            .submitted
            .clone()
            .ok_or_else(|| BuildError::NotSubmitted {
                action: self.actions[action.0].label.clone(),
            })?;

        let input = match on {
            DependsOn::Action(other) => {
                let other_nodes = self.actions[other.0].submitted.clone().ok_or_else(|| {
                    BuildError::NotSubmitted {
                        action: self.actions[other.0].label.clone(),
                    }
                })?;
                DependencyInput::Nodes(other_nodes)
            }
            DependsOn::Node(node) => DependencyInput::Nodes(vec![node]),
            DependsOn::Nodes(nodes) => DependencyInput::Nodes(nodes),
            DependsOn::Artifacts(paths) => DependencyInput::Artifacts(paths),
            DependsOn::Sources(list) => DependencyInput::Sources(list),
        };

        engine.depends(&nodes, &input).map_err(BuildError::Engine)
    }

    /// The nodes recorded for a submitted action.
    pub fn action_nodes(&self, id: ActionId) -> Option<&[NodeId]> {
        self.actions[id.0].submitted.as_deref()
    }

    /// An action's display label.
    pub fn action_label(&self, id: ActionId) -> &str {
        &self.actions[id.0].label
    }

    /// An action's absolute output directory, where the variant has one.
    pub fn action_output_path(&self, id: ActionId) -> Option<PathBuf> {
        let action = &self.actions[id.0];
        let base = self.project_output_path(action.project);
        match &action.kind {
            ActionKind::Objects(spec) => Some(base.join(&spec.output_dir)),
            ActionKind::StaticLibrary(spec) => Some(base.join(&spec.output_dir)),
            ActionKind::SharedLibrary(spec) => Some(base.join(&spec.output_dir)),
            ActionKind::Program(spec) => Some(base.join(&spec.output_dir)),
            ActionKind::Custom(_) => None,
        }
    }

    /// Mutable access to an action's toolset, before submission only.
    pub fn action_toolset_mut(&mut self, id: ActionId) -> Result<&mut Toolset, BuildError> {
        let action = &mut self.actions[id.0];
        if action.submitted.is_some() {
            return Err(BuildError::AlreadySubmitted {
                action: action.label.clone(),
            });
        }
        action
            .toolset
            .as_mut()
            .ok_or_else(|| BuildError::InvalidArgument {
                what: "action toolset",
                detail: format!("action `{}` carries no toolset", action.label),
            })
    }
}
