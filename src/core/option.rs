//! Compiler-independent build options and their per-backend renderings.
//!
//! Every option kind is a closed value enum with a `Default` sentinel that
//! renders to no flag on every backend. Rendering is a pure function from
//! `(backend, value)` to a flag fragment; approximations for values a
//! backend cannot express exactly are explicit table entries, never a
//! catch-all branch. The one combination with no usable mapping at all is
//! pre-C++14 standards on msvc, which has no conformance mode for them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::backend::Backend;
use crate::engine::env::{BuildEnv, FlagGroup};
use crate::errors::BuildError;

/// C++ language standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CxxStandard {
    /// Use the backend's default standard.
    #[default]
    Default,
    Cxx98,
    Cxx03,
    Cxx11,
    Cxx14,
    Cxx17,
    Cxx20,
}

impl CxxStandard {
    /// The flag value spelling shared by every family (`c++17`).
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            CxxStandard::Default => "default",
            CxxStandard::Cxx98 => "c++98",
            CxxStandard::Cxx03 => "c++03",
            CxxStandard::Cxx11 => "c++11",
            CxxStandard::Cxx14 => "c++14",
            CxxStandard::Cxx17 => "c++17",
            CxxStandard::Cxx20 => "c++20",
        }
    }
}

/// C language standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CStandard {
    #[default]
    Default,
    C89,
    C90,
    C99,
    C11,
    C17,
    C18,
}

impl CStandard {
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            CStandard::Default => "default",
            CStandard::C89 => "c89",
            CStandard::C90 => "c90",
            CStandard::C99 => "c99",
            CStandard::C11 => "c11",
            CStandard::C17 => "c17",
            CStandard::C18 => "c18",
        }
    }
}

/// Target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Architecture {
    #[default]
    Default,
    X86,
    X64,
    Arm,
    Arm64,
}

/// Warning policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningLevel {
    #[default]
    Default,
    Off,
    W1,
    W2,
    W3,
    W4,
    All,
}

/// Optimization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptLevel {
    #[default]
    Default,
    O0,
    O1,
    O2,
    O3,
    Os,
    Oz,
}

/// Debug-information level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebugInfo {
    /// Use the backend's default.
    #[default]
    Default,
    /// No debug information.
    Off,
    /// The backend's ordinary debug-info level.
    Standard,
    /// Full debug information.
    Full,
}

/// How the language runtime is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeLinking {
    #[default]
    Default,
    Static,
    Dynamic,
}

/// What the link step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputType {
    #[default]
    Default,
    Executable,
    StaticLibrary,
    DynamicLibrary,
}

/// Overall build flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildType {
    #[default]
    Default,
    Debug,
    Release,
    RelWithDebInfo,
}

/// Which output directory an output-directory option names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputDirKind {
    Bin,
    Obj,
    Lib,
    Pdb,
}

/// A single compiler/linker option: one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOption {
    CxxStandard(CxxStandard),
    CStandard(CStandard),
    Architecture(Architecture),
    WarningLevel(WarningLevel),
    WarningsAsErrors(bool),
    PositionIndependentCode(bool),
    Optimization(OptLevel),
    DebugInfo(DebugInfo),
    RuntimeLinking(RuntimeLinking),
    OutputType(OutputType),
    BuildType(BuildType),
    OutputDir(OutputDirKind, PathBuf),
}

impl ToolOption {
    /// The option-kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolOption::CxxStandard(_) => "c++ standard",
            ToolOption::CStandard(_) => "c standard",
            ToolOption::Architecture(_) => "architecture",
            ToolOption::WarningLevel(_) => "warning level",
            ToolOption::WarningsAsErrors(_) => "warnings as errors",
            ToolOption::PositionIndependentCode(_) => "position independent code",
            ToolOption::Optimization(_) => "optimization level",
            ToolOption::DebugInfo(_) => "debug information",
            ToolOption::RuntimeLinking(_) => "runtime linking",
            ToolOption::OutputType(_) => "output type",
            ToolOption::BuildType(_) => "build type",
            ToolOption::OutputDir(..) => "output directory",
        }
    }

    /// The flag group this option's rendering is appended to.
    pub fn group(&self) -> FlagGroup {
        match self {
            ToolOption::CxxStandard(_) => FlagGroup::CxxFlags,
            ToolOption::CStandard(_)
            | ToolOption::Architecture(_)
            | ToolOption::WarningLevel(_)
            | ToolOption::WarningsAsErrors(_)
            | ToolOption::PositionIndependentCode(_)
            | ToolOption::Optimization(_)
            | ToolOption::DebugInfo(_)
            | ToolOption::BuildType(_) => FlagGroup::CFlags,
            ToolOption::RuntimeLinking(_) | ToolOption::OutputType(_) => FlagGroup::LinkFlags,
            ToolOption::OutputDir(kind, _) => match kind {
                OutputDirKind::Obj => FlagGroup::CxxFlags,
                OutputDirKind::Bin | OutputDirKind::Lib | OutputDirKind::Pdb => {
                    FlagGroup::LinkFlags
                }
            },
        }
    }

    /// Render this option for a backend.
    ///
    /// Pure and deterministic; the empty vector means "no change from the
    /// backend default".
    pub fn render(&self, backend: Backend) -> Result<Vec<String>, BuildError> {
        match self {
            ToolOption::CxxStandard(std) => render_cxx_standard(backend, *std),
            ToolOption::CStandard(std) => Ok(render_c_standard(backend, *std)),
            ToolOption::Architecture(arch) => Ok(render_architecture(backend, *arch)),
            ToolOption::WarningLevel(level) => Ok(render_warning_level(backend, *level)),
            ToolOption::WarningsAsErrors(enabled) => {
                Ok(render_warnings_as_errors(backend, *enabled))
            }
            ToolOption::PositionIndependentCode(enabled) => Ok(render_pic(backend, *enabled)),
            ToolOption::Optimization(level) => Ok(render_optimization(backend, *level)),
            ToolOption::DebugInfo(level) => Ok(render_debug_info(backend, *level)),
            ToolOption::RuntimeLinking(mode) => Ok(render_runtime_linking(backend, *mode)),
            ToolOption::OutputType(kind) => Ok(render_output_type(backend, *kind)),
            ToolOption::BuildType(kind) => Ok(render_build_type(backend, *kind)),
            ToolOption::OutputDir(kind, dir) => Ok(render_output_dir(backend, *kind, dir)),
        }
    }

    /// Render and append to the option's flag group. Append-only: repeated
    /// application grows the group; this layer never deduplicates flags.
    pub fn apply_to(&self, backend: Backend, env: &mut BuildEnv) -> Result<(), BuildError> {
        let flags = self.render(backend)?;
        env.append_flags(self.group(), flags);
        Ok(())
    }

    /// One option of every kind, each at its default value.
    pub fn all_defaults() -> Vec<ToolOption> {
        vec![
            ToolOption::CxxStandard(CxxStandard::Default),
            ToolOption::CStandard(CStandard::Default),
            ToolOption::Architecture(Architecture::Default),
            ToolOption::WarningLevel(WarningLevel::Default),
            ToolOption::WarningsAsErrors(false),
            ToolOption::PositionIndependentCode(false),
            ToolOption::Optimization(OptLevel::Default),
            ToolOption::DebugInfo(DebugInfo::Default),
            ToolOption::RuntimeLinking(RuntimeLinking::Default),
            ToolOption::OutputType(OutputType::Default),
            ToolOption::BuildType(BuildType::Default),
        ]
    }
}

fn render_cxx_standard(backend: Backend, std: CxxStandard) -> Result<Vec<String>, BuildError> {
    if backend.is_gnu_flavored() {
        return Ok(match std {
            CxxStandard::Default => vec![],
            _ => vec![format!("-std={}", std.as_flag_value())],
        });
    }
    // msvc conformance modes start at c++14
    match std {
        CxxStandard::Default => Ok(vec![]),
        CxxStandard::Cxx98 | CxxStandard::Cxx03 => Err(BuildError::UnmappedOptionValue {
            backend,
            option: "c++ standard",
            value: std.as_flag_value().to_string(),
        }),
        CxxStandard::Cxx11 | CxxStandard::Cxx14 => Ok(vec!["/std:c++14".to_string()]),
        CxxStandard::Cxx17 => Ok(vec!["/std:c++17".to_string()]),
        CxxStandard::Cxx20 => Ok(vec!["/std:c++20".to_string()]),
    }
}

fn render_c_standard(backend: Backend, std: CStandard) -> Vec<String> {
    if backend.is_gnu_flavored() {
        return match std {
            CStandard::Default => vec![],
            _ => vec![format!("-std={}", std.as_flag_value())],
        };
    }
    match std {
        CStandard::Default => vec![],
        // cl's default C mode is the nearest thing to the pre-C11 standards
        CStandard::C89 | CStandard::C90 | CStandard::C99 => vec![],
        CStandard::C11 => vec!["/std:c11".to_string()],
        CStandard::C17 | CStandard::C18 => vec!["/std:c17".to_string()],
    }
}

fn render_architecture(backend: Backend, arch: Architecture) -> Vec<String> {
    if backend.is_gnu_flavored() {
        match arch {
            Architecture::Default => vec![],
            Architecture::X86 => vec!["-m32".to_string()],
            Architecture::X64 => vec!["-m64".to_string()],
            Architecture::Arm => vec!["-march=arm".to_string()],
            Architecture::Arm64 => vec!["-march=arm64".to_string()],
        }
    } else {
        match arch {
            Architecture::Default => vec![],
            Architecture::X86 => vec!["/arch:IA32".to_string()],
            Architecture::X64 => vec!["/arch:x64".to_string()],
            Architecture::Arm => vec!["/arch:ARM".to_string()],
            Architecture::Arm64 => vec!["/arch:ARM64".to_string()],
        }
    }
}

fn render_warning_level(backend: Backend, level: WarningLevel) -> Vec<String> {
    if backend.is_gnu_flavored() {
        match level {
            WarningLevel::Default => vec![],
            WarningLevel::Off => vec!["-w".to_string()],
            // gcc has no numbered levels; W1 is its default warning set,
            // W2/W3 approximate to -Wall, W4 to -Wall -Wextra
            WarningLevel::W1 => vec![],
            WarningLevel::W2 | WarningLevel::W3 | WarningLevel::All => {
                vec!["-Wall".to_string()]
            }
            WarningLevel::W4 => vec!["-Wall".to_string(), "-Wextra".to_string()],
        }
    } else {
        match level {
            WarningLevel::Default => vec![],
            WarningLevel::Off => vec!["/W0".to_string()],
            WarningLevel::W1 => vec!["/W1".to_string()],
            WarningLevel::W2 => vec!["/W2".to_string()],
            WarningLevel::W3 => vec!["/W3".to_string()],
            WarningLevel::W4 => vec!["/W4".to_string()],
            WarningLevel::All => vec!["/Wall".to_string()],
        }
    }
}

fn render_warnings_as_errors(backend: Backend, enabled: bool) -> Vec<String> {
    if !enabled {
        return vec![];
    }
    if backend.is_gnu_flavored() {
        vec!["-Werror".to_string()]
    } else {
        vec!["/WX".to_string()]
    }
}

fn render_pic(backend: Backend, enabled: bool) -> Vec<String> {
    if !enabled {
        return vec![];
    }
    if backend.is_gnu_flavored() {
        vec!["-fPIC".to_string()]
    } else {
        // position independence is implicit for DLLs; cl has no flag for it
        vec![]
    }
}

fn render_optimization(backend: Backend, level: OptLevel) -> Vec<String> {
    if backend.is_gnu_flavored() {
        match level {
            OptLevel::Default => vec![],
            OptLevel::O0 => vec!["-O0".to_string()],
            OptLevel::O1 => vec!["-O1".to_string()],
            OptLevel::O2 => vec!["-O2".to_string()],
            OptLevel::O3 => vec!["-O3".to_string()],
            OptLevel::Os => vec!["-Os".to_string()],
            OptLevel::Oz => vec!["-Oz".to_string()],
        }
    } else {
        match level {
            OptLevel::Default => vec![],
            OptLevel::O0 => vec!["/Od".to_string()],
            OptLevel::O1 => vec!["/O1".to_string()],
            // cl has no /O3; /O2 is the closest match
            OptLevel::O2 | OptLevel::O3 => vec!["/O2".to_string()],
            // cl has no /Oz; /Os is the closest match
            OptLevel::Os | OptLevel::Oz => vec!["/Os".to_string()],
        }
    }
}

fn render_debug_info(backend: Backend, level: DebugInfo) -> Vec<String> {
    match level {
        DebugInfo::Default | DebugInfo::Off => vec![],
        DebugInfo::Standard | DebugInfo::Full => {
            if backend.is_gnu_flavored() {
                vec!["-g".to_string()]
            } else {
                vec!["/Zi".to_string()]
            }
        }
    }
}

fn render_runtime_linking(backend: Backend, mode: RuntimeLinking) -> Vec<String> {
    if backend.is_gnu_flavored() {
        match mode {
            RuntimeLinking::Default => vec![],
            RuntimeLinking::Static => vec!["-static".to_string()],
            RuntimeLinking::Dynamic => vec!["-shared".to_string()],
        }
    } else {
        match mode {
            RuntimeLinking::Default => vec![],
            RuntimeLinking::Static => vec!["/MT".to_string()],
            RuntimeLinking::Dynamic => vec!["/MD".to_string()],
        }
    }
}

fn render_output_type(backend: Backend, kind: OutputType) -> Vec<String> {
    if backend.is_gnu_flavored() {
        match kind {
            OutputType::Default | OutputType::Executable => vec![],
            OutputType::StaticLibrary => vec!["-static".to_string()],
            OutputType::DynamicLibrary => vec!["-shared".to_string()],
        }
    } else {
        match kind {
            OutputType::Default => vec![],
            OutputType::Executable => vec!["/link".to_string()],
            OutputType::StaticLibrary => vec!["/LD".to_string()],
            OutputType::DynamicLibrary => vec!["/DLL".to_string()],
        }
    }
}

fn render_build_type(backend: Backend, kind: BuildType) -> Vec<String> {
    if backend.is_gnu_flavored() {
        match kind {
            BuildType::Default => vec![],
            BuildType::Debug => vec!["-g".to_string()],
            BuildType::Release => vec!["-O3".to_string()],
            BuildType::RelWithDebInfo => vec!["-O2".to_string(), "-g".to_string()],
        }
    } else {
        match kind {
            BuildType::Default => vec![],
            BuildType::Debug => vec!["/Zi".to_string(), "/Od".to_string()],
            BuildType::Release => vec!["/O2".to_string(), "/DNDEBUG".to_string()],
            BuildType::RelWithDebInfo => {
                vec!["/Zi".to_string(), "/O2".to_string(), "/DNDEBUG".to_string()]
            }
        }
    }
}

fn render_output_dir(backend: Backend, kind: OutputDirKind, dir: &Path) -> Vec<String> {
    if dir.as_os_str().is_empty() {
        return vec![];
    }
    if backend.is_gnu_flavored() {
        vec!["-o".to_string(), dir.display().to_string()]
    } else {
        match kind {
            OutputDirKind::Bin | OutputDirKind::Lib => {
                vec![format!("/OUT:{}", dir.display())]
            }
            OutputDirKind::Obj => vec![format!("/Fo{}", dir.display())],
            OutputDirKind::Pdb => vec![format!("/PDB:{}", dir.display())],
        }
    }
}

/// Render include-path flags (`-I` / `/I`).
pub fn render_include_flags(backend: Backend, paths: &[PathBuf]) -> Vec<String> {
    let prefix = if backend.is_gnu_flavored() { "-I" } else { "/I" };
    paths
        .iter()
        .map(|p| format!("{}{}", prefix, p.display()))
        .collect()
}

/// Render library-search-path flags (`-L` / `/LIBPATH:`).
pub fn render_library_path_flags(backend: Backend, paths: &[PathBuf]) -> Vec<String> {
    let prefix = if backend.is_gnu_flavored() {
        "-L"
    } else {
        "/LIBPATH:"
    };
    paths
        .iter()
        .map(|p| format!("{}{}", prefix, p.display()))
        .collect()
}

/// Render library flags.
///
/// GNU-flavored backends split an absolute library path into a search path
/// plus `-l<name>`; msvc takes library names verbatim.
pub fn render_library_flags(backend: Backend, libraries: &[String]) -> Vec<String> {
    if !backend.is_gnu_flavored() {
        return libraries.to_vec();
    }

    let mut flags = Vec::new();
    for lib in libraries {
        let path = Path::new(lib);
        if path.is_absolute() {
            if let (Some(dir), Some(name)) = (path.parent(), path.file_name()) {
                flags.push(format!("-L{}", dir.display()));
                flags.push(format!("-l{}", name.to_string_lossy()));
                continue;
            }
        }
        flags.push(format!("-l{}", lib));
    }
    flags
}

/// Render preprocessor-definition flags (`-D` / `/D`).
pub fn render_define_flags(backend: Backend, definitions: &[String]) -> Vec<String> {
    let prefix = if backend.is_gnu_flavored() { "-D" } else { "/D" };
    definitions
        .iter()
        .map(|d| format!("{}{}", prefix, d))
        .collect()
}
