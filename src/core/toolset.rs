//! Toolsets: an ordered bundle of options plus input accumulation lists.
//!
//! A toolset always carries one value per option kind (initialized to the
//! backend-default sentinel) and five accumulation lists. Applying a toolset
//! to a [`BuildEnv`] is a single pass over [`Toolset::items`].

use std::path::{Path, PathBuf};

use crate::core::backend::Backend;
use crate::core::option::{
    Architecture, BuildType, CStandard, CxxStandard, DebugInfo, OptLevel, OutputDirKind,
    OutputType, RuntimeLinking, ToolOption, WarningLevel,
};
use crate::engine::env::{BuildEnv, SourceList, SourceRef};
use crate::engine::NodeId;
use crate::errors::BuildError;

/// A single value or a batch of values for an accumulation method.
///
/// Argument shape is a compile-time concern: callers construct the wrapper
/// (usually through a `From` conversion) instead of the library inspecting
/// runtime types.
#[derive(Debug, Clone)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flatten into a vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        OneOrMany::One(item)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

impl From<&str> for OneOrMany<PathBuf> {
    fn from(path: &str) -> Self {
        OneOrMany::One(PathBuf::from(path))
    }
}

impl From<&Path> for OneOrMany<PathBuf> {
    fn from(path: &Path) -> Self {
        OneOrMany::One(path.to_path_buf())
    }
}

impl From<Vec<&str>> for OneOrMany<PathBuf> {
    fn from(paths: Vec<&str>) -> Self {
        OneOrMany::Many(paths.into_iter().map(PathBuf::from).collect())
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(item: &str) -> Self {
        OneOrMany::One(item.to_string())
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(items: Vec<&str>) -> Self {
        OneOrMany::Many(items.into_iter().map(str::to_string).collect())
    }
}

impl From<&str> for OneOrMany<SourceRef> {
    fn from(path: &str) -> Self {
        OneOrMany::One(SourceRef::from(path))
    }
}

impl From<PathBuf> for OneOrMany<SourceRef> {
    fn from(path: PathBuf) -> Self {
        OneOrMany::One(SourceRef::Path(path))
    }
}

impl From<Vec<PathBuf>> for OneOrMany<SourceRef> {
    fn from(paths: Vec<PathBuf>) -> Self {
        OneOrMany::Many(paths.into_iter().map(SourceRef::Path).collect())
    }
}

impl From<Vec<&str>> for OneOrMany<SourceRef> {
    fn from(paths: Vec<&str>) -> Self {
        OneOrMany::Many(paths.into_iter().map(SourceRef::from).collect())
    }
}

impl From<&SourceList> for OneOrMany<SourceRef> {
    fn from(list: &SourceList) -> Self {
        OneOrMany::Many(list.items().to_vec())
    }
}

/// One item of a toolset's iteration contract.
#[derive(Debug, Clone)]
pub enum ToolsetItem<'a> {
    IncludePaths(&'a [PathBuf]),
    Sources(&'a SourceList),
    LibraryPaths(&'a [PathBuf]),
    Libraries(&'a [String]),
    Definitions(&'a [String]),
    Option(ToolOption),
}

/// A compiler toolset: options plus accumulated inputs.
#[derive(Debug, Clone)]
pub struct Toolset {
    backend: Backend,

    cxx_standard: CxxStandard,
    c_standard: CStandard,
    architecture: Architecture,
    warning_level: WarningLevel,
    warnings_as_errors: bool,
    position_independent_code: bool,
    optimization: OptLevel,
    debug_info: DebugInfo,
    runtime_linking: RuntimeLinking,
    output_type: OutputType,
    build_type: BuildType,

    include_paths: Vec<PathBuf>,
    sources: SourceList,
    library_paths: Vec<PathBuf>,
    libraries: Vec<String>,
    definitions: Vec<String>,

    output_bin_dir: PathBuf,
    output_obj_dir: PathBuf,
    output_lib_dir: PathBuf,
    output_pdb_dir: PathBuf,
}

impl Toolset {
    /// Create a toolset for a backend, every option at its default.
    pub fn new(backend: Backend) -> Self {
        Toolset {
            backend,
            cxx_standard: CxxStandard::Default,
            c_standard: CStandard::Default,
            architecture: Architecture::Default,
            warning_level: WarningLevel::Default,
            warnings_as_errors: false,
            position_independent_code: false,
            optimization: OptLevel::Default,
            debug_info: DebugInfo::Default,
            runtime_linking: RuntimeLinking::Default,
            output_type: OutputType::Default,
            build_type: BuildType::Default,
            include_paths: Vec::new(),
            sources: SourceList::new(),
            library_paths: Vec::new(),
            libraries: Vec::new(),
            definitions: Vec::new(),
            output_bin_dir: PathBuf::new(),
            output_obj_dir: PathBuf::new(),
            output_lib_dir: PathBuf::new(),
            output_pdb_dir: PathBuf::new(),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    // option setters

    pub fn set_cxx_standard(&mut self, standard: CxxStandard) {
        self.cxx_standard = standard;
    }

    pub fn set_c_standard(&mut self, standard: CStandard) {
        self.c_standard = standard;
    }

    pub fn set_architecture(&mut self, architecture: Architecture) {
        self.architecture = architecture;
    }

    pub fn set_warning_level(&mut self, level: WarningLevel) {
        self.warning_level = level;
    }

    pub fn set_warnings_as_errors(&mut self, enabled: bool) {
        self.warnings_as_errors = enabled;
    }

    pub fn set_position_independent_code(&mut self, enabled: bool) {
        self.position_independent_code = enabled;
    }

    pub fn set_optimization(&mut self, level: OptLevel) {
        self.optimization = level;
    }

    pub fn set_debug_info(&mut self, level: DebugInfo) {
        self.debug_info = level;
    }

    pub fn set_runtime_linking(&mut self, mode: RuntimeLinking) {
        self.runtime_linking = mode;
    }

    pub fn set_output_type(&mut self, kind: OutputType) {
        self.output_type = kind;
    }

    pub fn set_build_type(&mut self, kind: BuildType) {
        self.build_type = kind;
    }

    pub fn set_output_bin_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_bin_dir = dir.into();
    }

    pub fn set_output_obj_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_obj_dir = dir.into();
    }

    pub fn set_output_lib_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_lib_dir = dir.into();
    }

    pub fn set_output_pdb_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_pdb_dir = dir.into();
    }

    // accumulation: always extends, never replaces

    pub fn add_include_path(&mut self, paths: impl Into<OneOrMany<PathBuf>>) {
        self.include_paths.extend(paths.into().into_vec());
    }

    pub fn add_source(&mut self, sources: impl Into<OneOrMany<SourceRef>>) {
        self.sources.extend(sources.into().into_vec());
    }

    pub fn add_library_path(&mut self, paths: impl Into<OneOrMany<PathBuf>>) {
        self.library_paths.extend(paths.into().into_vec());
    }

    pub fn add_library(&mut self, libraries: impl Into<OneOrMany<String>>) {
        self.libraries.extend(libraries.into().into_vec());
    }

    pub fn add_definition(&mut self, definitions: impl Into<OneOrMany<String>>) {
        self.definitions.extend(definitions.into().into_vec());
    }

    /// Replace the source list with already-materialized engine nodes.
    ///
    /// The one deliberate non-append operation: it passes a previously built
    /// artifact set through in place of raw sources.
    pub fn replace_sources(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.sources.replace_with_nodes(nodes);
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    pub fn library_paths(&self) -> &[PathBuf] {
        &self.library_paths
    }

    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    pub fn definitions(&self) -> &[String] {
        &self.definitions
    }

    /// Every option and list in application order.
    ///
    /// Consumers apply each item to an environment in one pass; the order is
    /// fixed so repeated applications are reproducible.
    pub fn items(&self) -> Vec<ToolsetItem<'_>> {
        vec![
            ToolsetItem::IncludePaths(&self.include_paths),
            ToolsetItem::Sources(&self.sources),
            ToolsetItem::LibraryPaths(&self.library_paths),
            ToolsetItem::Libraries(&self.libraries),
            ToolsetItem::Option(ToolOption::OutputDir(
                OutputDirKind::Bin,
                self.output_bin_dir.clone(),
            )),
            ToolsetItem::Option(ToolOption::OutputDir(
                OutputDirKind::Obj,
                self.output_obj_dir.clone(),
            )),
            ToolsetItem::Option(ToolOption::OutputDir(
                OutputDirKind::Lib,
                self.output_lib_dir.clone(),
            )),
            ToolsetItem::Option(ToolOption::OutputDir(
                OutputDirKind::Pdb,
                self.output_pdb_dir.clone(),
            )),
            ToolsetItem::Definitions(&self.definitions),
            ToolsetItem::Option(ToolOption::CxxStandard(self.cxx_standard)),
            ToolsetItem::Option(ToolOption::CStandard(self.c_standard)),
            ToolsetItem::Option(ToolOption::Architecture(self.architecture)),
            ToolsetItem::Option(ToolOption::WarningLevel(self.warning_level)),
            ToolsetItem::Option(ToolOption::WarningsAsErrors(self.warnings_as_errors)),
            ToolsetItem::Option(ToolOption::PositionIndependentCode(
                self.position_independent_code,
            )),
            ToolsetItem::Option(ToolOption::Optimization(self.optimization)),
            ToolsetItem::Option(ToolOption::DebugInfo(self.debug_info)),
            ToolsetItem::Option(ToolOption::RuntimeLinking(self.runtime_linking)),
            ToolsetItem::Option(ToolOption::OutputType(self.output_type)),
            ToolsetItem::Option(ToolOption::BuildType(self.build_type)),
        ]
    }

    /// Apply every item to an environment.
    ///
    /// List items append to the environment's typed lists; option items
    /// render and append to their flag group.
    pub fn apply_to(&self, env: &mut BuildEnv) -> Result<(), BuildError> {
        for item in self.items() {
            match item {
                ToolsetItem::IncludePaths(paths) => {
                    for path in paths {
                        env.add_include_dir(path.clone());
                    }
                }
                ToolsetItem::Sources(sources) => env.add_sources(sources),
                ToolsetItem::LibraryPaths(paths) => {
                    for path in paths {
                        env.add_lib_dir(path.clone());
                    }
                }
                ToolsetItem::Libraries(libraries) => {
                    self.apply_libraries(env, libraries);
                }
                ToolsetItem::Definitions(definitions) => {
                    for definition in definitions {
                        env.add_define(definition.clone());
                    }
                }
                ToolsetItem::Option(option) => option.apply_to(self.backend, env)?,
            }
        }
        Ok(())
    }

    /// GNU-flavored backends split an absolute library path into a search
    /// path plus a library name; msvc takes names verbatim.
    fn apply_libraries(&self, env: &mut BuildEnv, libraries: &[String]) {
        for library in libraries {
            let path = Path::new(library);
            if self.backend.is_gnu_flavored() && path.is_absolute() {
                if let (Some(dir), Some(name)) = (path.parent(), path.file_name()) {
                    env.add_lib_dir(dir.to_path_buf());
                    env.add_lib(name.to_string_lossy().into_owned());
                    continue;
                }
            }
            env.add_lib(library.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::env::FlagGroup;

    #[test]
    fn test_accumulation_is_monotonic_and_ordered() {
        let mut ts = Toolset::new(Backend::Gcc);
        ts.add_source("a.cpp");
        ts.add_source(vec!["b.cpp", "c.cpp"]);
        ts.add_source(PathBuf::from("d.cpp"));

        assert_eq!(ts.sources().len(), 4);
        let paths: Vec<_> = ts.sources().paths().collect();
        assert_eq!(paths[0], Path::new("a.cpp"));
        assert_eq!(paths[3], Path::new("d.cpp"));
    }

    #[test]
    fn test_merge_from_other_source_list() {
        let mut a = Toolset::new(Backend::Gcc);
        a.add_source(vec!["a.cpp", "b.cpp"]);

        let mut b = Toolset::new(Backend::Gcc);
        b.add_source("c.cpp");
        b.add_source(a.sources());

        assert_eq!(b.sources().len(), 3);
    }

    #[test]
    fn test_replace_sources_with_nodes() {
        let mut ts = Toolset::new(Backend::Msvc);
        ts.add_source(vec!["a.cpp", "b.cpp"]);
        ts.replace_sources([NodeId::new(1), NodeId::new(2), NodeId::new(3)]);

        assert_eq!(ts.sources().len(), 3);
        assert_eq!(ts.sources().paths().count(), 0);
    }

    #[test]
    fn test_default_toolset_applies_no_flags() {
        let ts = Toolset::new(Backend::Msvc);
        let mut env = BuildEnv::new();
        ts.apply_to(&mut env).unwrap();

        assert!(env.flags(FlagGroup::CFlags).is_empty());
        assert!(env.flags(FlagGroup::CxxFlags).is_empty());
        assert!(env.flags(FlagGroup::LinkFlags).is_empty());
        assert!(env.include_dirs().is_empty());
    }

    #[test]
    fn test_apply_routes_options_and_lists() {
        let mut ts = Toolset::new(Backend::Gcc);
        ts.set_optimization(OptLevel::O2);
        ts.set_warnings_as_errors(true);
        ts.set_cxx_standard(CxxStandard::Cxx17);
        ts.add_include_path("include");
        ts.add_definition("NDEBUG");
        ts.add_library("m");

        let mut env = BuildEnv::new();
        ts.apply_to(&mut env).unwrap();

        assert_eq!(env.flags(FlagGroup::CFlags), &["-O2", "-Werror"]);
        assert_eq!(env.flags(FlagGroup::CxxFlags), &["-std=c++17"]);
        assert_eq!(env.include_dirs(), &[PathBuf::from("include")]);
        assert_eq!(env.defines(), &["NDEBUG"]);
        assert_eq!(env.libs(), &["m"]);
    }

    #[test]
    fn test_absolute_library_split_on_gnu_apply() {
        let mut ts = Toolset::new(Backend::Gcc);
        ts.add_library(vec!["/opt/vendor/libz.a", "pthread"]);

        let mut env = BuildEnv::new();
        ts.apply_to(&mut env).unwrap();

        assert_eq!(env.lib_dirs(), &[PathBuf::from("/opt/vendor")]);
        assert_eq!(env.libs(), &["libz.a", "pthread"]);
    }

    #[test]
    fn test_msvc_keeps_library_names_verbatim() {
        let mut ts = Toolset::new(Backend::Msvc);
        ts.add_library(vec!["/opt/vendor/z.lib", "user32.lib"]);

        let mut env = BuildEnv::new();
        ts.apply_to(&mut env).unwrap();

        assert!(env.lib_dirs().is_empty());
        assert_eq!(env.libs(), &["/opt/vendor/z.lib", "user32.lib"]);
    }

    #[test]
    fn test_items_order_is_stable() {
        let ts = Toolset::new(Backend::Gcc);
        let items = ts.items();

        assert!(matches!(items[0], ToolsetItem::IncludePaths(_)));
        assert!(matches!(items[1], ToolsetItem::Sources(_)));
        assert!(matches!(
            items.last().unwrap(),
            ToolsetItem::Option(ToolOption::BuildType(_))
        ));
        assert_eq!(items.len(), 20);
    }
}
