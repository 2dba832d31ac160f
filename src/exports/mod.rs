//! The export-all-symbols synthesis stage.
//!
//! Derives a linker export list from compiled object files instead of
//! requiring source annotations: dump each object's symbol table, collect
//! the externally visible names, and render them as a module-definition
//! artifact for the link step.

pub mod def_file;
pub mod symbols;

pub use def_file::{render_module_definition, synthesize_module_definition, write_if_changed};
pub use symbols::{
    collect_exported_symbols, dump_symbols, locate_symbol_dump_tool, parse_symbol_records,
    SYMBOL_DUMP_TOOL,
};
