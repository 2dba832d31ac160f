//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::errors::BuildError;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| BuildError::ArtifactIo {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Collect source files under `root` matched by `include_patterns` and not
/// matched by `exclude_patterns`.
///
/// Patterns are glob-matched against file names (includes) and full paths
/// (excludes). A missing root yields no sources. Results are sorted so
/// repeated scans are deterministic.
pub fn collect_sources(
    root: &Path,
    recursive: bool,
    include_patterns: &[&str],
    exclude_patterns: &[&str],
) -> Result<Vec<PathBuf>, BuildError> {
    let includes = compile_patterns(include_patterns)?;
    let excludes = compile_patterns(exclude_patterns)?;

    if !root.exists() {
        tracing::debug!(root = %root.display(), "source directory absent, nothing to scan");
        return Ok(Vec::new());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).max_depth(max_depth) {
        let entry = entry.map_err(|e| BuildError::ArtifactIo {
            path: root.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !includes.iter().any(|p| p.matches(&name)) {
            continue;
        }
        if excludes.iter().any(|p| p.matches_path(entry.path()) || p.matches(&name)) {
            continue;
        }
        sources.push(entry.path().to_path_buf());
    }

    sources.sort();
    Ok(sources)
}

fn compile_patterns(patterns: &[&str]) -> Result<Vec<Pattern>, BuildError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| BuildError::InvalidArgument {
                what: "glob pattern",
                detail: format!("`{}`: {}", p, e),
            })
        })
        .collect()
}
