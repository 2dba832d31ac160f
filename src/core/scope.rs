//! Solution/project scope tree.
//!
//! A `Solution` is the root scope; projects are child scopes in an arena
//! owned by the solution. The tree owns downward; upward traversal (toolset
//! resolution) uses the non-owning parent id, so there are no ownership
//! cycles. Each scope clones its parent's environment at construction, and
//! each action clones its scope's environment, so later mutation never
//! reaches siblings or ancestors.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use url::Url;

use crate::actions::ActionData;
use crate::core::toolset::Toolset;
use crate::engine::env::BuildEnv;
use crate::errors::BuildError;
use crate::sources::git;

/// Host variables the Windows toolchain expects to see.
const WINDOWS_HOST_VARS: &[&str] = &[
    "LocalAppData",
    "AppData",
    "ProgramData",
    "ProgramFiles",
    "SystemRoot",
    "TEMP",
    "TMP",
    "USERPROFILE",
    "windir",
];

/// Index of a scope in the solution's arena. The root scope is the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectId(pub(crate) usize);

/// Index of an action in the solution's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub(crate) usize);

/// An ordered scope element; insertion order drives submission order.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Element {
    Project(ProjectId),
    Action(ActionId),
}

#[derive(Debug)]
pub(crate) struct ScopeData {
    pub(crate) name: String,
    pub(crate) parent: Option<ProjectId>,
    pub(crate) path: PathBuf,
    pub(crate) output_path: PathBuf,
    pub(crate) git_url: Option<Url>,
    pub(crate) env: BuildEnv,
    pub(crate) toolsets: BTreeMap<String, Toolset>,
    pub(crate) elements: Vec<Element>,
}

/// The root of a project tree plus the arenas for scopes and actions.
#[derive(Debug)]
pub struct Solution {
    pub(crate) scopes: Vec<ScopeData>,
    pub(crate) actions: Vec<ActionData>,
}

impl Solution {
    /// Create a solution rooted at `path`, writing outputs under
    /// `output_root`.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        let mut env = BuildEnv::new();
        if cfg!(target_os = "windows") {
            env.import_host_vars(WINDOWS_HOST_VARS);
        }

        Solution {
            scopes: vec![ScopeData {
                name: name.into(),
                parent: None,
                path: path.into(),
                output_path: output_root.into(),
                git_url: None,
                env,
                toolsets: BTreeMap::new(),
                elements: Vec::new(),
            }],
            actions: Vec::new(),
        }
    }

    /// The root scope id.
    pub fn root(&self) -> ProjectId {
        ProjectId(0)
    }

    /// Create a project under `parent`.
    ///
    /// `rel_path` and `rel_output` are joined onto the parent's paths; the
    /// project's environment is a clone of the parent's taken now.
    pub fn add_project(
        &mut self,
        parent: ProjectId,
        name: impl Into<String>,
        rel_path: impl AsRef<Path>,
        rel_output: impl AsRef<Path>,
        git_url: Option<Url>,
    ) -> ProjectId {
        let parent_scope = &self.scopes[parent.0];
        let scope = ScopeData {
            name: name.into(),
            parent: Some(parent),
            path: parent_scope.path.join(rel_path.as_ref()),
            output_path: parent_scope.output_path.join(rel_output.as_ref()),
            git_url,
            env: parent_scope.env.clone(),
            toolsets: BTreeMap::new(),
            elements: Vec::new(),
        };

        let id = ProjectId(self.scopes.len());
        self.scopes.push(scope);
        self.scopes[parent.0].elements.push(Element::Project(id));
        id
    }

    /// Register a toolset under a name in a scope. Names are unique per
    /// scope; a child may shadow an ancestor's registration.
    pub fn register_toolset(
        &mut self,
        scope: ProjectId,
        name: impl Into<String>,
        toolset: Toolset,
    ) -> Result<(), BuildError> {
        let name = name.into();
        let data = &mut self.scopes[scope.0];
        if data.toolsets.contains_key(&name) {
            return Err(BuildError::DuplicateToolset {
                toolset: name,
                scope: data.name.clone(),
            });
        }
        data.toolsets.insert(name, toolset);
        Ok(())
    }

    /// Resolve a toolset name in a scope or the nearest ancestor.
    ///
    /// A miss at the root returns `None` so callers can report "not found
    /// in this scope or any ancestor" with the offending names.
    pub fn find_toolset(&self, scope: ProjectId, name: &str) -> Option<&Toolset> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = &self.scopes[id.0];
            if let Some(toolset) = data.toolsets.get(name) {
                return Some(toolset);
            }
            current = data.parent;
        }
        None
    }

    /// A scope's name.
    pub fn project_name(&self, id: ProjectId) -> &str {
        &self.scopes[id.0].name
    }

    /// A scope's absolute source path.
    pub fn project_path(&self, id: ProjectId) -> &Path {
        &self.scopes[id.0].path
    }

    /// A scope's absolute output path.
    pub fn project_output_path(&self, id: ProjectId) -> &Path {
        &self.scopes[id.0].output_path
    }

    /// Set a variable on a scope's base environment. Actions constructed
    /// afterwards inherit it; existing actions are unaffected.
    pub fn set_var(&mut self, scope: ProjectId, key: impl Into<String>, value: impl Into<String>) {
        self.scopes[scope.0].env.set_var(key, value);
    }

    /// Import host environment variables into a scope's base environment.
    pub fn import_host_vars(&mut self, scope: ProjectId, keys: &[&str]) {
        self.scopes[scope.0].env.import_host_vars(keys);
    }

    /// Make sure a project's sources exist, cloning its git remote when the
    /// path is absent.
    pub fn ensure_project_sources(&self, id: ProjectId) -> Result<(), BuildError> {
        let scope = &self.scopes[id.0];
        if scope.path.exists() {
            return Ok(());
        }

        let Some(url) = &scope.git_url else {
            return Err(BuildError::SourcesUnavailable {
                project: scope.name.clone(),
                path: scope.path.clone(),
                detail: "path is absent and no git url is configured".to_string(),
            });
        };

        git::ensure_cloned(url, &scope.path).map_err(|e| BuildError::SourcesUnavailable {
            project: scope.name.clone(),
            path: scope.path.clone(),
            detail: format!("{:#}", e),
        })
    }

    /// Render the scope/action tree for doctor-style output.
    pub fn tree_display(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Solution: {}", self.scopes[0].name);
        self.render_children(ProjectId(0), 1, &mut out);
        out
    }

    fn render_children(&self, scope: ProjectId, depth: usize, out: &mut String) {
        for element in &self.scopes[scope.0].elements {
            let indent = "  ".repeat(depth);
            match element {
                Element::Project(id) => {
                    let _ = writeln!(out, "{}Project: {}", indent, self.scopes[id.0].name);
                    self.render_children(*id, depth + 1, out);
                }
                Element::Action(id) => {
                    let action = &self.actions[id.0];
                    let _ = writeln!(
                        out,
                        "{}Action: {} `{}`",
                        indent,
                        action.kind_name(),
                        action.label
                    );
                }
            }
        }
    }

    /// All action ids in submission order (declaration order, depth-first).
    pub(crate) fn submission_order(&self) -> Vec<ActionId> {
        let mut order = Vec::new();
        self.collect_order(ProjectId(0), &mut order);
        order
    }

    fn collect_order(&self, scope: ProjectId, order: &mut Vec<ActionId>) {
        for element in &self.scopes[scope.0].elements {
            match element {
                Element::Action(id) => order.push(*id),
                Element::Project(id) => self.collect_order(*id, order),
            }
        }
    }

    pub(crate) fn attach_action(&mut self, scope: ProjectId, action: ActionData) -> ActionId {
        let id = ActionId(self.actions.len());
        self.actions.push(action);
        self.scopes[scope.0].elements.push(Element::Action(id));
        id
    }
}
