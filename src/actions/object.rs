//! Object-file compilation actions.

use std::path::{Path, PathBuf};

use crate::actions::{ActionInputs, ActionKind, ToolsetRef};
use crate::core::scope::{ActionId, ProjectId, Solution};
use crate::core::toolset::Toolset;
use crate::errors::BuildError;
use crate::util::fs::collect_sources;

/// Spec for an object-compilation action: one engine node per source.
pub struct ObjectsSpec {
    /// Output directory, relative to the project's output path.
    pub(crate) output_dir: PathBuf,
}

/// Default glob patterns for C/C++ translation units.
pub const DEFAULT_SOURCE_PATTERNS: &[&str] = &["*.cpp", "*.c", "*.cc", "*.cxx"];

/// Default exclude patterns: test translation units.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] =
    &["*_test.cpp", "*_test.c", "*_test.cc", "*_test.cxx"];

impl Solution {
    /// Create an object-compilation action on `project`.
    ///
    /// `toolset` is a registered name or an inline instance; the inputs are
    /// forwarded onto the action's private toolset clone.
    pub fn add_object_files(
        &mut self,
        project: ProjectId,
        toolset: impl Into<ToolsetRef>,
        output_dir: impl Into<PathBuf>,
        inputs: ActionInputs,
    ) -> Result<ActionId, BuildError> {
        let mut toolset = self.resolve_toolset(project, toolset.into())?;
        apply_inputs(&mut toolset, inputs);

        let output_dir = output_dir.into();
        let label = format!("objects:{}", output_dir.display());
        Ok(self.new_action(
            project,
            label,
            Some(toolset),
            ActionKind::Objects(ObjectsSpec { output_dir }),
        ))
    }

    /// Scan a directory for sources and add them to an action's toolset.
    ///
    /// Include patterns default to the C/C++ translation-unit extensions;
    /// exclude patterns drop `*_test.*` files. A missing directory yields no
    /// sources rather than an error.
    pub fn add_sources_in_directory(
        &mut self,
        action: ActionId,
        root: impl AsRef<Path>,
        recursive: bool,
    ) -> Result<(), BuildError> {
        let sources = collect_sources(
            root.as_ref(),
            recursive,
            DEFAULT_SOURCE_PATTERNS,
            DEFAULT_EXCLUDE_PATTERNS,
        )?;
        self.action_toolset_mut(action)?.add_source(sources);
        Ok(())
    }
}

pub(crate) fn apply_inputs(toolset: &mut Toolset, inputs: ActionInputs) {
    toolset.add_source(&inputs.sources);
    toolset.add_include_path(inputs.include_paths);
    toolset.add_library_path(inputs.library_paths);
    toolset.add_library(inputs.libraries);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::Backend;
    use crate::engine::env::SourceList;
    use crate::engine::recording::{GraphRecorder, NodeKind};

    #[test]
    fn test_objects_submit_one_node_per_source() {
        let mut sol = Solution::new("demo", "/src", "/out");
        let root = sol.root();
        sol.register_toolset(root, "base", Toolset::new(Backend::Gcc))
            .unwrap();

        let mut sources = SourceList::new();
        sources.extend(["a.cpp", "b.cpp"]);
        let action = sol
            .add_object_files(
                root,
                "base",
                "obj",
                ActionInputs {
                    sources,
                    ..Default::default()
                },
            )
            .unwrap();

        let mut recorder = GraphRecorder::new();
        sol.submit(&mut recorder).unwrap();

        let nodes = sol.action_nodes(action).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(recorder.node(nodes[0]).unwrap().kind, NodeKind::Object);
    }

    #[test]
    fn test_unknown_toolset_is_a_configuration_error() {
        let mut sol = Solution::new("demo", "/src", "/out");
        let root = sol.root();
        let child = sol.add_project(root, "child", "child", "child", None);

        let err = sol
            .add_object_files(child, "release", "obj", ActionInputs::default())
            .unwrap_err();

        match err {
            BuildError::ToolsetNotFound { toolset, project } => {
                assert_eq!(toolset, "release");
                assert_eq!(project, "child");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // no partial action state committed
        assert!(sol.submission_order().is_empty());
    }

    #[test]
    fn test_resubmission_rejected() {
        let mut sol = Solution::new("demo", "/src", "/out");
        let root = sol.root();
        let action = sol
            .add_object_files(
                root,
                Toolset::new(Backend::Gcc),
                "obj",
                ActionInputs::default(),
            )
            .unwrap();

        let mut recorder = GraphRecorder::new();
        sol.submit_action(action, &mut recorder).unwrap();
        let err = sol.submit_action(action, &mut recorder).unwrap_err();
        assert!(matches!(err, BuildError::AlreadySubmitted { .. }));
    }

    #[test]
    fn test_scan_directory_for_sources() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.cpp"), "").unwrap();
        std::fs::write(tmp.path().join("a_test.cpp"), "").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/b.cc"), "").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let mut sol = Solution::new("demo", tmp.path(), tmp.path().join("out"));
        let root = sol.root();
        let action = sol
            .add_object_files(
                root,
                Toolset::new(Backend::Gcc),
                "obj",
                ActionInputs::default(),
            )
            .unwrap();

        sol.add_sources_in_directory(action, tmp.path(), true)
            .unwrap();

        let mut recorder = GraphRecorder::new();
        sol.submit(&mut recorder).unwrap();
        // a.cpp and sub/b.cc; the test file and notes.txt are excluded
        assert_eq!(sol.action_nodes(action).unwrap().len(), 2);

        // object nodes record the envs they were built from
        let node = sol.action_nodes(action).unwrap()[0];
        assert!(recorder.node(node).unwrap().env.is_some());
    }
}
