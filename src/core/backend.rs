//! Compiler/linker backend families.
//!
//! A `Backend` names the flag dialect a toolset renders to. The GNU-flavored
//! families (gcc, clang, clang-cl) share flag syntax; msvc has its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::BuildError;

/// The compiler family a toolset targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// GCC (g++)
    Gcc,
    /// Clang/LLVM (clang++)
    Clang,
    /// Clang with the cl driver on Windows
    ClangCl,
    /// Microsoft Visual C++ (cl.exe)
    Msvc,
}

impl Backend {
    /// Get the backend name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gcc => "gcc",
            Backend::Clang => "clang",
            Backend::ClangCl => "clang-cl",
            Backend::Msvc => "msvc",
        }
    }

    /// Whether this backend takes GNU-style flags (`-O2`, `-Wall`, ...).
    ///
    /// clang-cl accepts the GNU spellings for everything this layer emits.
    pub fn is_gnu_flavored(&self) -> bool {
        !matches!(self, Backend::Msvc)
    }

    /// The default backend for the host platform.
    pub fn host_default() -> Backend {
        if cfg!(target_os = "windows") {
            Backend::Msvc
        } else {
            Backend::Gcc
        }
    }

    /// Parse a backend name (as used in config files and env vars).
    pub fn from_name(name: &str) -> Result<Backend, BuildError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gcc" | "g++" => Ok(Backend::Gcc),
            "clang" | "clang++" => Ok(Backend::Clang),
            "clang-cl" | "clangcl" => Ok(Backend::ClangCl),
            "msvc" | "cl" => Ok(Backend::Msvc),
            other => Err(BuildError::UnsupportedBackend {
                backend: other.to_string(),
            }),
        }
    }

    /// Classify a compiler program name (`cc`, `/usr/bin/clang++`, `cl.exe`).
    ///
    /// Returns `None` when the name matches no known family.
    pub fn classify_compiler(program: &str) -> Option<Backend> {
        let base = program
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(program)
            .trim_end_matches(".exe");

        match base {
            "cl" => Some(Backend::Msvc),
            "clang-cl" => Some(Backend::ClangCl),
            "clang" | "clang++" => Some(Backend::Clang),
            "gcc" | "g++" | "cc" | "c++" => Some(Backend::Gcc),
            other if other.ends_with("-gcc") || other.ends_with("-g++") => Some(Backend::Gcc),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::from_name(s)
    }
}
