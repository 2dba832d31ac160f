//! Per-action build environment.
//!
//! A `BuildEnv` is the bag of named flag groups and input lists an execution
//! engine consumes when constructing a node. Environments are value types:
//! every action and every child scope gets its own deep clone, so mutating
//! one never leaks into siblings or ancestors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::NodeId;

/// The named string-flag groups an environment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagGroup {
    /// Flags for every compile step (C and C++).
    CFlags,
    /// Flags for C++ compile steps only.
    CxxFlags,
    /// Flags for link steps.
    LinkFlags,
}

/// A build input: either a source path or an already-materialized engine node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRef {
    /// A file on disk.
    Path(PathBuf),
    /// The output of a previously submitted node.
    Node(NodeId),
}

impl From<PathBuf> for SourceRef {
    fn from(p: PathBuf) -> Self {
        SourceRef::Path(p)
    }
}

impl From<&Path> for SourceRef {
    fn from(p: &Path) -> Self {
        SourceRef::Path(p.to_path_buf())
    }
}

impl From<&str> for SourceRef {
    fn from(p: &str) -> Self {
        SourceRef::Path(PathBuf::from(p))
    }
}

impl From<NodeId> for SourceRef {
    fn from(n: NodeId) -> Self {
        SourceRef::Node(n)
    }
}

/// An ordered, append-only list of build inputs.
///
/// `extend`-style operations always append; `replace_with_nodes` is the one
/// deliberate override, used to pass an already-built artifact set through
/// in place of raw sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceList {
    items: Vec<SourceRef>,
}

impl SourceList {
    /// Create an empty list.
    pub fn new() -> Self {
        SourceList::default()
    }

    /// Append a single input.
    pub fn push(&mut self, item: impl Into<SourceRef>) {
        self.items.push(item.into());
    }

    /// Append every input from an iterator.
    pub fn extend<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceRef>,
    {
        self.items.extend(items.into_iter().map(Into::into));
    }

    /// Append the contents of another list.
    pub fn extend_from(&mut self, other: &SourceList) {
        self.items.extend(other.items.iter().cloned());
    }

    /// Replace the whole list with resolved engine nodes.
    ///
    /// This is the explicit "already-built objects" pass-through; it is the
    /// only operation that discards previously accumulated inputs.
    pub fn replace_with_nodes(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.items = nodes.into_iter().map(SourceRef::Node).collect();
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[SourceRef] {
        &self.items
    }

    /// Only the path-valued items, in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.items.iter().filter_map(|s| match s {
            SourceRef::Path(p) => Some(p.as_path()),
            SourceRef::Node(_) => None,
        })
    }

    /// Only the node-valued items, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().filter_map(|s| match s {
            SourceRef::Node(n) => Some(*n),
            SourceRef::Path(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&SourceList> for SourceList {
    fn from(other: &SourceList) -> Self {
        other.clone()
    }
}

/// The environment handed to the engine with each node request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildEnv {
    cflags: Vec<String>,
    cxxflags: Vec<String>,
    linkflags: Vec<String>,
    include_dirs: Vec<PathBuf>,
    lib_dirs: Vec<PathBuf>,
    libs: Vec<String>,
    defines: Vec<String>,
    sources: SourceList,
    vars: BTreeMap<String, String>,
}

impl BuildEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        BuildEnv::default()
    }

    /// Append a flag to a named group. Appends never remove or deduplicate.
    pub fn append_flag(&mut self, group: FlagGroup, flag: impl Into<String>) {
        self.group_mut(group).push(flag.into());
    }

    /// Append several flags to a named group.
    pub fn append_flags<I, S>(&mut self, group: FlagGroup, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_mut(group).extend(flags.into_iter().map(Into::into));
    }

    fn group_mut(&mut self, group: FlagGroup) -> &mut Vec<String> {
        match group {
            FlagGroup::CFlags => &mut self.cflags,
            FlagGroup::CxxFlags => &mut self.cxxflags,
            FlagGroup::LinkFlags => &mut self.linkflags,
        }
    }

    /// Read a named flag group.
    pub fn flags(&self, group: FlagGroup) -> &[String] {
        match group {
            FlagGroup::CFlags => &self.cflags,
            FlagGroup::CxxFlags => &self.cxxflags,
            FlagGroup::LinkFlags => &self.linkflags,
        }
    }

    /// Append an include directory.
    pub fn add_include_dir(&mut self, dir: impl Into<PathBuf>) {
        self.include_dirs.push(dir.into());
    }

    /// Append a library search directory.
    pub fn add_lib_dir(&mut self, dir: impl Into<PathBuf>) {
        self.lib_dirs.push(dir.into());
    }

    /// Append a library to link.
    pub fn add_lib(&mut self, lib: impl Into<String>) {
        self.libs.push(lib.into());
    }

    /// Append a preprocessor definition.
    pub fn add_define(&mut self, def: impl Into<String>) {
        self.defines.push(def.into());
    }

    /// Append build inputs.
    pub fn add_sources(&mut self, sources: &SourceList) {
        self.sources.extend_from(sources);
    }

    /// Set an environment variable visible to spawned tools.
    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Import variables from the host environment, skipping unset keys.
    pub fn import_host_vars(&mut self, keys: &[&str]) {
        for key in keys {
            if let Ok(value) = std::env::var(key) {
                self.vars.insert((*key).to_string(), value);
            }
        }
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    pub fn lib_dirs(&self) -> &[PathBuf] {
        &self.lib_dirs
    }

    pub fn libs(&self) -> &[String] {
        &self.libs
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_groups_are_append_only() {
        let mut env = BuildEnv::new();
        env.append_flag(FlagGroup::CFlags, "-O2");
        env.append_flag(FlagGroup::CFlags, "-O2");
        env.append_flags(FlagGroup::LinkFlags, ["-shared", "-fPIC"]);

        // no deduplication at this layer
        assert_eq!(env.flags(FlagGroup::CFlags), &["-O2", "-O2"]);
        assert_eq!(env.flags(FlagGroup::LinkFlags), &["-shared", "-fPIC"]);
        assert!(env.flags(FlagGroup::CxxFlags).is_empty());
    }

    #[test]
    fn test_clone_isolates_mutation() {
        let mut base = BuildEnv::new();
        base.add_include_dir("/usr/include");

        let mut child = base.clone();
        child.add_include_dir("/opt/include");
        child.append_flag(FlagGroup::CFlags, "-g");

        assert_eq!(base.include_dirs().len(), 1);
        assert!(base.flags(FlagGroup::CFlags).is_empty());
        assert_eq!(child.include_dirs().len(), 2);
    }

    #[test]
    fn test_source_list_accumulation_is_monotonic() {
        let mut list = SourceList::new();
        list.push("a.cpp");
        list.extend(["b.cpp", "c.cpp"]);

        let mut other = SourceList::new();
        other.push("d.cpp");
        list.extend_from(&other);

        assert_eq!(list.len(), 4);
        let paths: Vec<_> = list.paths().collect();
        assert_eq!(paths[0], Path::new("a.cpp"));
        assert_eq!(paths[3], Path::new("d.cpp"));
    }

    #[test]
    fn test_replace_with_nodes_discards_paths() {
        let mut list = SourceList::new();
        list.push("a.cpp");
        list.replace_with_nodes([NodeId::new(7), NodeId::new(9)]);

        assert_eq!(list.len(), 2);
        assert_eq!(list.paths().count(), 0);
        let nodes: Vec<_> = list.nodes().collect();
        assert_eq!(nodes, vec![NodeId::new(7), NodeId::new(9)]);
    }

    #[test]
    fn test_set_var() {
        let mut env = BuildEnv::new();
        env.set_var("TEMP", "/tmp");
        assert_eq!(env.vars().get("TEMP").map(String::as_str), Some("/tmp"));
    }
}
