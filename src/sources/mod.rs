//! Project source acquisition.
//!
//! Projects may name a git remote; when a project's path is absent, the
//! solution materializes the sources by cloning before submission.

pub mod git;

pub use git::ensure_cloned;
