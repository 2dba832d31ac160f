//! Backend selection configuration.
//!
//! Resolution priority:
//! 1. Project config (`.slipway/backend.toml` next to the solution)
//! 2. User config (`backend.toml` in the platform config directory)
//! 3. Environment variables (`SLIPWAY_BACKEND`, then `CC`)
//! 4. PATH probing for known compilers
//! 5. The host default (msvc on Windows, gcc elsewhere)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::core::backend::Backend;
use crate::errors::BuildError;
use crate::util::process::find_executable;

/// Environment variable naming the backend directly.
pub const BACKEND_ENV_VAR: &str = "SLIPWAY_BACKEND";

/// Contents of a `backend.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    /// Backend family name (`gcc`, `clang`, `clang-cl`, `msvc`).
    pub backend: Option<String>,
}

/// Path of the project-level config under a solution directory.
pub fn project_config_path(solution_dir: &Path) -> PathBuf {
    solution_dir.join(".slipway").join("backend.toml")
}

/// Path of the user-level config, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "slipway").map(|dirs| dirs.config_dir().join("backend.toml"))
}

/// Load a config file; a missing file is an empty config.
pub fn load_config(path: &Path) -> BackendConfig {
    let Ok(text) = std::fs::read_to_string(path) else {
        return BackendConfig::default();
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unparseable config: {}", e);
            BackendConfig::default()
        }
    }
}

/// Resolve the backend for a solution directory.
pub fn resolve_backend(solution_dir: &Path) -> Result<Backend, BuildError> {
    // project config wins over user config
    for path in [project_config_path(solution_dir)]
        .into_iter()
        .chain(user_config_path())
    {
        if let Some(name) = load_config(&path).backend {
            let backend = Backend::from_name(&name)?;
            tracing::debug!(backend = %backend, config = %path.display(), "backend from config");
            return Ok(backend);
        }
    }

    if let Ok(name) = std::env::var(BACKEND_ENV_VAR) {
        let backend = Backend::from_name(&name)?;
        tracing::debug!(backend = %backend, "backend from {}", BACKEND_ENV_VAR);
        return Ok(backend);
    }

    if let Ok(cc) = std::env::var("CC") {
        if let Some(backend) = Backend::classify_compiler(&cc) {
            tracing::debug!(backend = %backend, "backend from CC");
            return Ok(backend);
        }
        tracing::warn!(cc = %cc, "CC names no known compiler family, probing PATH");
    }

    if let Some(backend) = probe_path() {
        return Ok(backend);
    }

    Ok(Backend::host_default())
}

/// Probe PATH for a known compiler, msvc first on Windows.
fn probe_path() -> Option<Backend> {
    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &["cl", "clang-cl", "clang", "gcc"]
    } else {
        &["cc", "gcc", "clang"]
    };

    for candidate in candidates {
        if find_executable(candidate).is_some() {
            let backend = Backend::classify_compiler(candidate)?;
            tracing::debug!(backend = %backend, probe = candidate, "backend from PATH");
            return Some(backend);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_empty() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&project_config_path(tmp.path()));
        assert!(config.backend.is_none());
    }

    #[test]
    fn test_project_config_parses() {
        let tmp = TempDir::new().unwrap();
        let path = project_config_path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "backend = \"clang\"\n").unwrap();

        let config = load_config(&path);
        assert_eq!(config.backend.as_deref(), Some("clang"));
    }

    #[test]
    fn test_unparseable_config_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("backend.toml");
        std::fs::write(&path, "backend = [not toml").unwrap();
        assert!(load_config(&path).backend.is_none());
    }

    #[test]
    fn test_config_backend_resolves() {
        let tmp = TempDir::new().unwrap();
        let path = project_config_path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "backend = \"msvc\"\n").unwrap();

        assert_eq!(resolve_backend(tmp.path()).unwrap(), Backend::Msvc);
    }

    #[test]
    fn test_unknown_backend_name_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = project_config_path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "backend = \"icc\"\n").unwrap();

        let err = resolve_backend(tmp.path()).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedBackend { .. }));
    }
}
