//! Git repository acquisition.
//!
//! Materializes a project's sources by cloning its remote (branch `main`,
//! submodules included) when the project path does not exist on disk. The
//! existence check itself belongs to the caller.

use std::path::Path;

use anyhow::{Context, Result};
use git2::build::RepoBuilder;
use url::Url;

/// The branch cloned for project sources.
const DEFAULT_BRANCH: &str = "main";

/// Clone `url` to `path` with submodules, for a path known to be absent.
pub fn ensure_cloned(url: &Url, path: &Path) -> Result<()> {
    tracing::info!(remote = %url, path = %path.display(), "cloning project sources");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let repo = RepoBuilder::new()
        .branch(DEFAULT_BRANCH)
        .clone(url.as_str(), path)
        .with_context(|| format!("failed to clone {}", url))?;

    update_submodules(&repo).with_context(|| format!("failed to fetch submodules of {}", url))?;

    tracing::info!(remote = %url, "clone complete");
    Ok(())
}

fn update_submodules(repo: &git2::Repository) -> Result<()> {
    for mut submodule in repo.submodules()? {
        submodule.update(true, None).with_context(|| {
            format!(
                "failed to update submodule `{}`",
                submodule.name().unwrap_or("<invalid utf-8>")
            )
        })?;
    }
    Ok(())
}
