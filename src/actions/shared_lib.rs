//! Shared-library actions.
//!
//! Two strategies: a direct link, or a three-stage pipeline that compiles
//! objects, synthesizes a module-definition file from their symbol tables,
//! and links against it. The pipeline runs only when export-all-symbols is
//! requested and the backend is msvc; it emulates exporting every public
//! symbol for a linker family that requires an explicit export list.

use std::path::{Path, PathBuf};

use crate::actions::{ActionKind, ToolsetRef};
use crate::core::backend::Backend;
use crate::core::scope::{ActionId, ProjectId, Solution};
use crate::core::toolset::Toolset;
use crate::engine::env::{BuildEnv, FlagGroup, SourceList};
use crate::engine::{CustomStep, DependencyInput, ExecutionEngine, NodeId};
use crate::errors::BuildError;
use crate::exports;
use crate::util::fs::collect_sources;

use super::object::{DEFAULT_EXCLUDE_PATTERNS, DEFAULT_SOURCE_PATTERNS};

/// Preprocessor definition announced to sources built for full export.
const EXPORT_ALL_DEFINE: &str = "EXPORT_ALL_SYMBOLS";

/// Spec for a shared-library action.
pub struct SharedLibrarySpec {
    pub(crate) target: String,
    pub(crate) output_dir: PathBuf,
    pub(crate) export_all_symbols: bool,
}

/// Construction options for [`Solution::add_shared_library`].
#[derive(Debug, Clone, Copy)]
pub struct SharedLibraryOptions {
    /// Scan the source directory recursively and add every translation unit.
    pub add_all_sources: bool,
    /// Add the source directory itself as an include path.
    pub include_source_directory: bool,
}

impl Default for SharedLibraryOptions {
    fn default() -> Self {
        SharedLibraryOptions {
            add_all_sources: true,
            include_source_directory: true,
        }
    }
}

impl Solution {
    /// Create a shared-library action on `project`.
    ///
    /// `source_dir` is relative to the project path; `output_dir` to the
    /// project's output path.
    pub fn add_shared_library(
        &mut self,
        project: ProjectId,
        toolset: impl Into<ToolsetRef>,
        target: impl Into<String>,
        source_dir: impl AsRef<Path>,
        output_dir: impl Into<PathBuf>,
        options: SharedLibraryOptions,
    ) -> Result<ActionId, BuildError> {
        let mut toolset = self.resolve_toolset(project, toolset.into())?;

        let source_path = self.project_path(project).join(source_dir.as_ref());
        if options.add_all_sources {
            let sources = collect_sources(
                &source_path,
                true,
                DEFAULT_SOURCE_PATTERNS,
                DEFAULT_EXCLUDE_PATTERNS,
            )?;
            toolset.add_source(sources);
        }
        if options.include_source_directory {
            toolset.add_include_path(source_path);
        }

        let target = target.into();
        Ok(self.new_action(
            project,
            target.clone(),
            Some(toolset),
            ActionKind::SharedLibrary(SharedLibrarySpec {
                target,
                output_dir: output_dir.into(),
                export_all_symbols: false,
            }),
        ))
    }

    /// Request the export-all-symbols strategy for a shared-library action.
    ///
    /// Also defines `EXPORT_ALL_SYMBOLS` for the action's sources. The
    /// pipeline itself only engages on the msvc backend; elsewhere the
    /// direct link already exports public symbols.
    pub fn export_all_symbols(&mut self, action: ActionId) -> Result<(), BuildError> {
        let data = &mut self.actions[action.0];
        if data.submitted.is_some() {
            return Err(BuildError::AlreadySubmitted {
                action: data.label.clone(),
            });
        }
        match &mut data.kind {
            ActionKind::SharedLibrary(spec) => {
                spec.export_all_symbols = true;
                if let Some(toolset) = &mut data.toolset {
                    toolset.add_definition(EXPORT_ALL_DEFINE);
                }
                Ok(())
            }
            _ => Err(BuildError::InvalidArgument {
                what: "export_all_symbols",
                detail: format!("action `{}` is not a shared library", data.label),
            }),
        }
    }
}

/// Submit a shared-library action, picking the link strategy.
pub(crate) fn submit_shared_library<E: ExecutionEngine>(
    engine: &mut E,
    env: &mut BuildEnv,
    toolset: Option<&Toolset>,
    spec: &SharedLibrarySpec,
    project_output: &Path,
) -> Result<Vec<NodeId>, BuildError> {
    let output_dir = project_output.join(&spec.output_dir);
    let target_path = output_dir.join(&spec.target);

    let use_pipeline =
        spec.export_all_symbols && toolset.map(Toolset::backend) == Some(Backend::Msvc);
    if !use_pipeline {
        return engine
            .shared_library(env, &target_path)
            .map_err(BuildError::Engine);
    }

    tracing::debug!(target = %spec.target, "export-all-symbols pipeline");

    // stage 1: compile the toolset's sources to objects
    let objects = engine.objects(env).map_err(BuildError::Engine)?;
    engine
        .depends(&objects, &DependencyInput::Sources(env.sources().clone()))
        .map_err(BuildError::Engine)?;

    // stage 2: synthesize the module-definition file from the objects
    let def_path = output_dir.join(format!("{}.def", spec.target));
    let mut def_sources = SourceList::new();
    def_sources.extend(objects.iter().copied());

    let def_nodes = engine
        .custom(
            env,
            CustomStep {
                name: "module_definition".to_string(),
                target: def_path.clone(),
                sources: def_sources,
                handler: Box::new(synthesize_definition),
            },
        )
        .map_err(BuildError::Engine)?;
    engine
        .depends(&def_nodes, &DependencyInput::Nodes(objects.clone()))
        .map_err(BuildError::Engine)?;

    // stage 3: link objects plus the definition file
    env.append_flag(FlagGroup::LinkFlags, format!("/DEF:{}", def_path.display()));
    let nodes = engine
        .shared_library(env, &target_path)
        .map_err(BuildError::Engine)?;
    engine
        .depends(&nodes, &DependencyInput::Nodes(def_nodes))
        .map_err(BuildError::Engine)?;
    engine
        .depends(&nodes, &DependencyInput::Nodes(objects))
        .map_err(BuildError::Engine)?;

    Ok(nodes)
}

/// Handler for the definition-synthesis step: locate the dump tool, extract
/// public symbols from every object, and write the artifact if it changed.
fn synthesize_definition(target: &Path, objects: &[PathBuf]) -> anyhow::Result<()> {
    let tool = exports::locate_symbol_dump_tool()?;
    exports::synthesize_module_definition(&tool, target, objects)?;
    Ok(())
}
