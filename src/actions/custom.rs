//! Custom build-step actions.
//!
//! A custom action registers an arbitrary external handler with the engine;
//! the handler receives the target path and the materialized source paths
//! when the engine decides the step must run.

use std::path::PathBuf;

use crate::actions::ActionKind;
use crate::core::scope::{ActionId, ProjectId, Solution};
use crate::engine::env::{SourceList, SourceRef};
use crate::engine::CustomHandler;
use crate::errors::BuildError;

/// Spec for a custom step. The handler is consumed at submission.
pub struct CustomSpec {
    pub(crate) step_name: String,
    pub(crate) target: PathBuf,
    pub(crate) sources: SourceList,
    pub(crate) handler: Option<CustomHandler>,
}

impl Solution {
    /// Register a custom build step on `project`.
    ///
    /// Custom steps carry no toolset; their environment is the project's
    /// clone as-is.
    pub fn add_custom_step(
        &mut self,
        project: ProjectId,
        name: impl Into<String>,
        target: impl Into<PathBuf>,
        sources: impl IntoIterator<Item = impl Into<SourceRef>>,
        handler: CustomHandler,
    ) -> Result<ActionId, BuildError> {
        let name = name.into();
        let mut source_list = SourceList::new();
        source_list.extend(sources);

        Ok(self.new_action(
            project,
            name.clone(),
            None,
            ActionKind::Custom(CustomSpec {
                step_name: name,
                target: target.into(),
                sources: source_list,
                handler: Some(handler),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{GraphRecorder, NodeKind};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_custom_step_registers_and_runs() {
        let mut sol = Solution::new("demo", "/src", "/out");
        let root = sol.root();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_seen = calls.clone();
        let action = sol
            .add_custom_step(
                root,
                "stamp_version",
                "/out/version.h",
                ["version.h.in"],
                Box::new(move |target, sources| {
                    assert_eq!(target, Path::new("/out/version.h"));
                    assert_eq!(sources, [PathBuf::from("version.h.in")]);
                    calls_seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();

        let mut recorder = GraphRecorder::new();
        sol.submit(&mut recorder).unwrap();

        let node = sol.action_nodes(action).unwrap()[0];
        assert_eq!(recorder.node(node).unwrap().kind, NodeKind::Custom);

        recorder.run_custom(node).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_step_handler_failure_propagates() {
        let mut sol = Solution::new("demo", "/src", "/out");
        let root = sol.root();

        let action = sol
            .add_custom_step(
                root,
                "broken",
                "/out/x",
                Vec::<SourceRef>::new(),
                Box::new(|_, _| anyhow::bail!("boom")),
            )
            .unwrap();

        let mut recorder = GraphRecorder::new();
        sol.submit(&mut recorder).unwrap();

        let node = sol.action_nodes(action).unwrap()[0];
        let err = recorder.run_custom(node).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
