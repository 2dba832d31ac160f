//! Module-definition artifact rendering and idempotent writing.
//!
//! Format: a literal `EXPORTS` header line, then one tab-indented symbol per
//! line, no trailing newline. Writes are skipped when the rendered bytes
//! match the existing artifact, so downstream results cached on the file's
//! modification time are not spuriously invalidated.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::BuildError;

use super::symbols::collect_exported_symbols;

/// Render a module-definition document from an ordered symbol set.
pub fn render_module_definition<'a>(symbols: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::from("EXPORTS");
    for symbol in symbols {
        out.push('\n');
        out.push('\t');
        out.push_str(symbol);
    }
    out
}

/// Write `content` to `path` only when it differs from what is there.
///
/// An absent file reads as empty content, not an error. Returns whether a
/// write happened.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool, BuildError> {
    let existing = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(BuildError::ArtifactIo {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if existing == content {
        tracing::debug!(path = %path.display(), "module definition unchanged");
        return Ok(false);
    }

    std::fs::write(path, content).map_err(|e| BuildError::ArtifactIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "module definition written");
    Ok(true)
}

/// Extract, render, and write the module definition for a set of objects.
///
/// Returns whether the artifact was rewritten. Fails before touching the
/// artifact if any extraction step fails: partial symbol lists are never
/// written.
pub fn synthesize_module_definition(
    tool: &Path,
    target: &Path,
    objects: &[PathBuf],
) -> Result<bool, BuildError> {
    let symbols = collect_exported_symbols(tool, objects)?;
    let content = render_from_set(&symbols);
    write_if_changed(target, &content)
}

fn render_from_set(symbols: &BTreeSet<String>) -> String {
    render_module_definition(symbols.iter().map(String::as_str))
}
