//! Static-library actions.

use std::path::PathBuf;

use crate::actions::object::apply_inputs;
use crate::actions::{ActionInputs, ActionKind, ToolsetRef};
use crate::core::scope::{ActionId, ProjectId, Solution};
use crate::errors::BuildError;

/// Spec for a static-library link action.
pub struct StaticLibrarySpec {
    pub(crate) target: String,
    pub(crate) output_dir: PathBuf,
}

impl Solution {
    /// Create a static-library action on `project`.
    pub fn add_static_library(
        &mut self,
        project: ProjectId,
        toolset: impl Into<ToolsetRef>,
        target: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        inputs: ActionInputs,
    ) -> Result<ActionId, BuildError> {
        let mut toolset = self.resolve_toolset(project, toolset.into())?;
        apply_inputs(&mut toolset, inputs);

        let target = target.into();
        Ok(self.new_action(
            project,
            target.clone(),
            Some(toolset),
            ActionKind::StaticLibrary(StaticLibrarySpec {
                target,
                output_dir: output_dir.into(),
            }),
        ))
    }
}
