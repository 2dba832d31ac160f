//! End-to-end tests for the solution/toolset/action pipeline.
//!
//! These drive the public API against the recording engine, from project
//! setup through submission and dependency-edge declaration.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use slipway::core::{CxxStandard, OptLevel};
use slipway::engine::recording::NodeKind;
use slipway::engine::DependencyInput;
use slipway::exports;
use slipway::{
    ActionInputs, Backend, BuildError, DependsOn, ExecutionEngine, FlagGroup, GraphRecorder,
    SharedLibraryOptions, Solution, SourceList, Toolset,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A solution over a temp directory with one `src/lib.cpp` translation unit.
fn single_source_solution(tmp: &TempDir) -> Solution {
    init_tracing();
    std::fs::create_dir_all(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("src/lib.cpp"), "int answer() { return 42; }").unwrap();
    Solution::new("demo", tmp.path(), tmp.path().join("build"))
}

fn tuned_toolset(backend: Backend) -> Toolset {
    let mut toolset = Toolset::new(backend);
    toolset.set_optimization(OptLevel::O2);
    toolset.set_warnings_as_errors(true);
    toolset
}

// ============================================================================
// option rendering end to end
// ============================================================================

#[test]
fn gcc_backend_renders_gnu_flags() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();
    sol.register_toolset(root, "tuned", tuned_toolset(Backend::Gcc))
        .unwrap();

    let mut sources = SourceList::new();
    sources.push(tmp.path().join("src/lib.cpp"));
    let action = sol
        .add_object_files(
            root,
            "tuned",
            "obj",
            ActionInputs {
                sources,
                ..Default::default()
            },
        )
        .unwrap();

    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();

    let node = sol.action_nodes(action).unwrap()[0];
    let env = recorder.node(node).unwrap().env.as_ref().unwrap();

    // exactly the requested optimization and warning policy, nothing else
    assert_eq!(env.flags(FlagGroup::CFlags), &["-O2", "-Werror"]);
    assert!(env.flags(FlagGroup::CxxFlags).is_empty());
}

#[test]
fn msvc_backend_renders_cl_flags() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();
    sol.register_toolset(root, "tuned", tuned_toolset(Backend::Msvc))
        .unwrap();

    let mut sources = SourceList::new();
    sources.push(tmp.path().join("src/lib.cpp"));
    let action = sol
        .add_object_files(
            root,
            "tuned",
            "obj",
            ActionInputs {
                sources,
                ..Default::default()
            },
        )
        .unwrap();

    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();

    let node = sol.action_nodes(action).unwrap()[0];
    let env = recorder.node(node).unwrap().env.as_ref().unwrap();

    assert_eq!(env.flags(FlagGroup::CFlags), &["/O2", "/WX"]);
}

#[test]
fn cxx_standard_lands_in_cxx_flags() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();

    let mut toolset = Toolset::new(Backend::Clang);
    toolset.set_cxx_standard(CxxStandard::Cxx17);
    let action = sol
        .add_shared_library(
            root,
            toolset,
            "demo",
            "src",
            "lib",
            SharedLibraryOptions::default(),
        )
        .unwrap();

    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();

    let node = sol.action_nodes(action).unwrap()[0];
    let env = recorder.node(node).unwrap().env.as_ref().unwrap();
    assert_eq!(env.flags(FlagGroup::CxxFlags), &["-std=c++17"]);
    // the scanned source directory became an include path
    assert!(env
        .include_dirs()
        .iter()
        .any(|p| p.ends_with("src")));
}

// ============================================================================
// toolset resolution
// ============================================================================

#[test]
fn unregistered_toolset_names_toolset_and_project() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();
    let sub = sol.add_project(root, "renderer", "renderer", "renderer", None);

    let err = sol
        .add_object_files(sub, "release", "obj", ActionInputs::default())
        .unwrap_err();

    match err {
        BuildError::ToolsetNotFound { toolset, project } => {
            assert_eq!(toolset, "release");
            assert_eq!(project, "renderer");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // nothing was committed: submission finds no actions
    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();
    assert_eq!(recorder.node_count(), 0);
}

#[test]
fn toolset_shadowing_resolves_to_nearest_scope() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();
    let sub = sol.add_project(root, "engine", "engine", "engine", None);

    sol.register_toolset(root, "base", Toolset::new(Backend::Gcc))
        .unwrap();
    sol.register_toolset(sub, "base", Toolset::new(Backend::Msvc))
        .unwrap();

    assert_eq!(sol.find_toolset(sub, "base").unwrap().backend(), Backend::Msvc);
    assert_eq!(
        sol.find_toolset(root, "base").unwrap().backend(),
        Backend::Gcc
    );
    assert!(sol.find_toolset(sub, "missing").is_none());
}

// ============================================================================
// dependency edges
// ============================================================================

#[test]
fn dependency_edges_require_submitted_endpoints() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();

    let lib = sol
        .add_static_library(
            root,
            Toolset::new(Backend::Gcc),
            "core",
            "lib",
            ActionInputs::default(),
        )
        .unwrap();
    let app = sol
        .add_program(
            root,
            Toolset::new(Backend::Gcc),
            "app",
            "bin",
            ActionInputs::default(),
        )
        .unwrap();

    let mut recorder = GraphRecorder::new();
    let err = sol
        .add_dependency(&mut recorder, app, DependsOn::Action(lib))
        .unwrap_err();
    assert!(matches!(err, BuildError::NotSubmitted { .. }));

    sol.submit(&mut recorder).unwrap();
    sol.add_dependency(&mut recorder, app, DependsOn::Action(lib))
        .unwrap();

    let app_node = sol.action_nodes(app).unwrap()[0];
    let lib_node = sol.action_nodes(lib).unwrap()[0];
    assert!(recorder.depends_directly(app_node, lib_node));
}

#[test]
fn submission_order_follows_declaration_order() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();

    let first = sol
        .add_static_library(
            root,
            Toolset::new(Backend::Gcc),
            "first",
            "lib",
            ActionInputs::default(),
        )
        .unwrap();
    let sub = sol.add_project(root, "engine", "engine", "engine", None);
    let nested = sol
        .add_program(
            sub,
            Toolset::new(Backend::Gcc),
            "nested",
            "bin",
            ActionInputs::default(),
        )
        .unwrap();
    let last = sol
        .add_program(
            root,
            Toolset::new(Backend::Gcc),
            "last",
            "bin",
            ActionInputs::default(),
        )
        .unwrap();

    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();

    let ids: Vec<_> = [first, nested, last]
        .iter()
        .map(|a| sol.action_nodes(*a).unwrap()[0])
        .collect();
    // node ids are issued in submission order: first, then the subtree, then last
    assert!(ids[0] < ids[1]);
    assert!(ids[1] < ids[2]);
}

// ============================================================================
// export-all-symbols pipeline
// ============================================================================

#[test]
fn export_pipeline_links_against_definition_and_objects() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("src/a.cpp"), "").unwrap();
    std::fs::write(tmp.path().join("src/b.cpp"), "").unwrap();

    let mut sol = Solution::new("demo", tmp.path(), tmp.path().join("build"));
    let root = sol.root();
    sol.register_toolset(root, "msvc", Toolset::new(Backend::Msvc))
        .unwrap();

    let lib = sol
        .add_shared_library(
            root,
            "msvc",
            "engine",
            "src",
            "lib",
            SharedLibraryOptions::default(),
        )
        .unwrap();
    sol.export_all_symbols(lib).unwrap();

    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();

    let link = sol.action_nodes(lib).unwrap()[0];
    let deps = recorder.dependencies_of(link);

    let objects: Vec<_> = deps
        .iter()
        .filter(|d| recorder.node(**d).unwrap().kind == NodeKind::Object)
        .collect();
    let custom: Vec<_> = deps
        .iter()
        .filter(|d| recorder.node(**d).unwrap().kind == NodeKind::Custom)
        .collect();
    assert_eq!(objects.len(), 2);
    assert_eq!(custom.len(), 1);

    // the definition step consumes both objects
    let def_deps = recorder.dependencies_of(*custom[0]);
    assert_eq!(
        def_deps
            .iter()
            .filter(|d| recorder.node(**d).unwrap().kind == NodeKind::Object)
            .count(),
        2
    );

    // and the definition artifact path feeds the link flags
    let env = recorder.node(link).unwrap().env.as_ref().unwrap();
    assert!(env
        .flags(FlagGroup::LinkFlags)
        .iter()
        .any(|f| f.starts_with("/DEF:") && f.ends_with("engine.def")));
}

// ============================================================================
// module-definition synthesis
// ============================================================================

const DUMP_FOO_BAR: &str = "\
COFF SYMBOL TABLE
008 00000000 SECT1  notype ()    External     | foo
00A 00000010 SECT1  notype ()    External     | bar
00C 00000000 UNDEF  notype ()    External     | __imp_GetProcAddress
";

const DUMP_BAR_BAZ: &str = "\
COFF SYMBOL TABLE
008 00000000 SECT1  notype ()    External     | bar
00A 00000010 SECT1  notype ()    External     | baz
";

#[test]
fn definition_document_dedups_and_orders_symbols() {
    let mut symbols = std::collections::BTreeSet::new();
    symbols.extend(exports::parse_symbol_records(DUMP_FOO_BAR));
    symbols.extend(exports::parse_symbol_records(DUMP_BAR_BAZ));

    let content = exports::render_module_definition(
        symbols.iter().map(String::as_str),
    );
    // bar appears in both objects but exactly once here
    assert_eq!(content, "EXPORTS\n\tbar\n\tbaz\n\tfoo");
}

#[test]
fn definition_writes_are_idempotent() {
    let tmp = TempDir::new().unwrap();
    let def = tmp.path().join("engine.def");
    let content = "EXPORTS\n\tbar\n\tfoo";

    // write count: 1 on first run, 0 on identical rerun
    assert!(exports::write_if_changed(&def, content).unwrap());
    assert!(!exports::write_if_changed(&def, content).unwrap());
    assert_eq!(std::fs::read_to_string(&def).unwrap(), content);

    // a pre-matching artifact is never rewritten
    let other = tmp.path().join("other.def");
    std::fs::write(&other, content).unwrap();
    assert!(!exports::write_if_changed(&other, content).unwrap());
}

// ============================================================================
// custom steps and raw-artifact edges
// ============================================================================

#[test]
fn custom_step_and_artifact_dependency() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();

    let generated = tmp.path().join("build/version.h");
    let step = sol
        .add_custom_step(
            root,
            "stamp_version",
            generated.clone(),
            [tmp.path().join("src/lib.cpp")],
            Box::new(|target: &Path, _sources: &[PathBuf]| {
                std::fs::create_dir_all(target.parent().unwrap())?;
                std::fs::write(target, "#define VERSION 1\n")?;
                Ok(())
            }),
        )
        .unwrap();

    let app = sol
        .add_program(
            root,
            Toolset::new(Backend::Gcc),
            "app",
            "bin",
            ActionInputs::default(),
        )
        .unwrap();

    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();
    sol.add_dependency(&mut recorder, app, DependsOn::Action(step))
        .unwrap();
    sol.add_dependency(
        &mut recorder,
        app,
        DependsOn::Artifacts(vec![generated.clone()]),
    )
    .unwrap();

    let step_node = sol.action_nodes(step).unwrap()[0];
    recorder.run_custom(step_node).unwrap();
    assert_eq!(
        std::fs::read_to_string(&generated).unwrap(),
        "#define VERSION 1\n"
    );

    let app_node = sol.action_nodes(app).unwrap()[0];
    assert!(recorder.depends_directly(app_node, step_node));
    assert_eq!(recorder.dependencies_of(app_node).len(), 2);
}

// ============================================================================
// graph snapshot
// ============================================================================

#[test]
fn graph_snapshot_lists_nodes_and_edges() {
    let tmp = TempDir::new().unwrap();
    let mut sol = single_source_solution(&tmp);
    let root = sol.root();

    let mut sources = SourceList::new();
    sources.push(tmp.path().join("src/lib.cpp"));
    let objs = sol
        .add_object_files(
            root,
            Toolset::new(Backend::Gcc),
            "obj",
            ActionInputs {
                sources: sources.clone(),
                ..Default::default()
            },
        )
        .unwrap();

    let mut recorder = GraphRecorder::new();
    sol.submit(&mut recorder).unwrap();

    let nodes = sol.action_nodes(objs).unwrap().to_vec();
    recorder
        .depends(&nodes, &DependencyInput::Sources(sources))
        .unwrap();

    let snapshot = tmp.path().join("graph.json");
    recorder.write_graph_json(&snapshot).unwrap();
    let text = std::fs::read_to_string(&snapshot).unwrap();
    assert!(text.contains("\"object\""));
    assert!(text.contains("lib.cpp"));
    assert!(text.contains("\"edges\""));
}
