//! Symbol-table extraction from compiled objects.
//!
//! Runs the backend's symbol-dump tool (`dumpbin /SYMBOLS`) over each object
//! file and parses the textual output for externally visible symbols. Any
//! tool failure aborts the whole extraction: a partial export list is worse
//! than no build.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::BuildError;
use crate::util::process::{find_executable, ProcessBuilder};

/// The symbol-dump tool of the msvc family.
pub const SYMBOL_DUMP_TOOL: &str = "dumpbin";

/// One symbol record in dumpbin output:
/// `00A 00000010 SECT3  notype ()    External     | ?frob@@YAXXZ`
static SYMBOL_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9A-Fa-f]{3} [0-9A-Fa-f]{8} (.{5}) .*(External|Public).*\| (\S+)")
        .expect("symbol record pattern is valid")
});

/// Locate the symbol-dump tool on PATH.
pub fn locate_symbol_dump_tool() -> Result<PathBuf, BuildError> {
    find_executable(SYMBOL_DUMP_TOOL).ok_or_else(|| BuildError::ToolNotFound {
        tool: SYMBOL_DUMP_TOOL.to_string(),
    })
}

/// Run the dump tool over one object file and return its raw output.
pub fn dump_symbols(tool: &Path, object: &Path) -> Result<String, BuildError> {
    let output = ProcessBuilder::new(tool)
        .arg("/SYMBOLS")
        .arg(object)
        .exec()
        .map_err(|e| BuildError::ExternalToolFailure {
            tool: SYMBOL_DUMP_TOOL.to_string(),
            object: object.to_path_buf(),
            detail: format!("{:#}", e),
        })?;

    if !output.status.success() {
        return Err(BuildError::ExternalToolFailure {
            tool: SYMBOL_DUMP_TOOL.to_string(),
            object: object.to_path_buf(),
            detail: format!(
                "exit code {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| BuildError::ExternalToolFailure {
        tool: SYMBOL_DUMP_TOOL.to_string(),
        object: object.to_path_buf(),
        detail: "symbol dump output is not valid UTF-8".to_string(),
    })
}

/// Parse dump output line by line for externally visible symbol names.
///
/// Undefined-symbol records (`UNDEF`) are skipped: they name imports, not
/// exports. Matching is case-sensitive; duplicates are kept (callers dedup).
pub fn parse_symbol_records(output: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    for line in output.lines() {
        if let Some(captures) = SYMBOL_RECORD.captures(line) {
            if line.contains("UNDEF") {
                continue;
            }
            if let Some(name) = captures.get(3) {
                symbols.push(name.as_str().to_string());
            }
        }
    }
    symbols
}

/// Extract the deduplicated export set from a list of object files.
///
/// Objects are processed sequentially; the first failure aborts. The
/// `BTreeSet` gives the stable, deterministic order the definition file is
/// written in.
pub fn collect_exported_symbols(
    tool: &Path,
    objects: &[PathBuf],
) -> Result<BTreeSet<String>, BuildError> {
    let mut symbols = BTreeSet::new();
    for object in objects {
        let output = dump_symbols(tool, object)?;
        let parsed = parse_symbol_records(&output);
        tracing::debug!(
            object = %object.display(),
            count = parsed.len(),
            "extracted symbols"
        );
        symbols.extend(parsed);
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{SAMPLE_DUMP_BAR_BAZ, SAMPLE_DUMP_FOO_BAR};

    #[test]
    fn test_parse_extracts_external_symbols() {
        let symbols = parse_symbol_records(SAMPLE_DUMP_FOO_BAR);
        assert_eq!(symbols, vec!["foo", "bar"]);
    }

    #[test]
    fn test_parse_skips_undefined_records() {
        let output = "\
008 00000000 UNDEF  notype ()    External     | __imp_GetLastError\n\
00A 00000010 SECT3  notype ()    External     | exported_fn\n";
        let symbols = parse_symbol_records(output);
        assert_eq!(symbols, vec!["exported_fn"]);
    }

    #[test]
    fn test_parse_skips_static_records() {
        let output = "\
00C 00000020 SECT3  notype ()    Static       | local_helper\n\
00D 00000030 SECT3  notype ()    External     | public_fn\n";
        let symbols = parse_symbol_records(output);
        assert_eq!(symbols, vec!["public_fn"]);
    }

    #[test]
    fn test_parse_ignores_non_record_lines() {
        let output = "\
Microsoft (R) COFF/PE Dumper Version 14.29\n\
Dump of file a.obj\n\
\n\
COFF SYMBOL TABLE\n";
        assert!(parse_symbol_records(output).is_empty());
    }

    #[test]
    fn test_dedup_across_objects() {
        // {foo, bar} and {bar, baz} must collapse to {bar, baz, foo}
        let mut set = std::collections::BTreeSet::new();
        set.extend(parse_symbol_records(SAMPLE_DUMP_FOO_BAR));
        set.extend(parse_symbol_records(SAMPLE_DUMP_BAR_BAZ));

        let symbols: Vec<_> = set.into_iter().collect();
        assert_eq!(symbols, vec!["bar", "baz", "foo"]);
    }

    #[test]
    fn test_missing_tool_is_tool_not_found() {
        // dumpbin is not installed in the unix test environment
        if find_executable(SYMBOL_DUMP_TOOL).is_none() {
            let err = locate_symbol_dump_tool().unwrap_err();
            assert!(matches!(err, BuildError::ToolNotFound { .. }));
        }
    }

    #[test]
    fn test_dump_failure_names_tool_and_object() {
        let err = dump_symbols(Path::new("/no/such/dumpbin"), Path::new("a.obj")).unwrap_err();
        match err {
            BuildError::ExternalToolFailure { tool, object, .. } => {
                assert_eq!(tool, "dumpbin");
                assert_eq!(object, PathBuf::from("a.obj"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
