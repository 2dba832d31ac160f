//! Core build-description types.
//!
//! - Backend families and detection
//! - The compiler-independent option model
//! - Toolsets (options + accumulated inputs)
//! - The solution/project scope tree

pub mod backend;
pub mod option;
pub mod scope;
pub mod toolset;

pub use backend::Backend;
pub use option::{
    Architecture, BuildType, CStandard, CxxStandard, DebugInfo, OptLevel, OutputDirKind,
    OutputType, RuntimeLinking, ToolOption, WarningLevel,
};
pub use scope::{ActionId, ProjectId, Solution};
pub use toolset::{OneOrMany, Toolset, ToolsetItem};
