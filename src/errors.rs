//! Build-description error taxonomy.
//!
//! Nothing in this layer is retried: every error is fatal to the enclosing
//! action's submission and propagates up to abort the whole solution.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::backend::Backend;
use crate::util::diagnostic::Diagnostic;

/// Error raised while describing or submitting a build.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    /// A toolset name did not resolve in the scope or any of its ancestors.
    #[error("toolset `{toolset}` not found in project `{project}` or its parents")]
    #[diagnostic(code(slipway::config::toolset_not_found))]
    ToolsetNotFound { toolset: String, project: String },

    /// A toolset name was registered twice in the same scope.
    #[error("toolset `{toolset}` is already registered in scope `{scope}`")]
    #[diagnostic(code(slipway::config::duplicate_toolset))]
    DuplicateToolset { toolset: String, scope: String },

    /// An accumulation method or constructor received an argument it cannot use.
    #[error("invalid argument for {what}: {detail}")]
    #[diagnostic(code(slipway::config::invalid_argument))]
    InvalidArgument { what: &'static str, detail: String },

    /// A dependency edge referenced an action that has not been submitted.
    #[error("action `{action}` has not been submitted; dependency edges require submitted endpoints")]
    #[diagnostic(code(slipway::graph::not_submitted))]
    NotSubmitted { action: String },

    /// An action was submitted a second time.
    #[error("action `{action}` was already submitted")]
    #[diagnostic(code(slipway::graph::already_submitted))]
    AlreadySubmitted { action: String },

    /// A backend identity outside the supported compiler families.
    #[error("unsupported backend `{backend}`")]
    #[diagnostic(
        code(slipway::option::unsupported_backend),
        help("supported backends: gcc, clang, clang-cl, msvc")
    )]
    UnsupportedBackend { backend: String },

    /// An option value with no defined mapping for the requested backend.
    #[error("option `{option}` value `{value}` has no mapping for backend `{backend}`")]
    #[diagnostic(code(slipway::option::unmapped_value))]
    UnmappedOptionValue {
        backend: Backend,
        option: &'static str,
        value: String,
    },

    /// A required external tool is missing from the search path.
    #[error("required tool `{tool}` not found on PATH")]
    #[diagnostic(code(slipway::exports::tool_not_found))]
    ToolNotFound { tool: String },

    /// An external tool failed or produced output this layer cannot use.
    #[error("`{tool}` failed for `{}`: {detail}", object.display())]
    #[diagnostic(code(slipway::exports::tool_failure))]
    ExternalToolFailure {
        tool: String,
        object: PathBuf,
        detail: String,
    },

    /// Reading or writing a build artifact failed.
    #[error("artifact I/O failed for `{}`", path.display())]
    #[diagnostic(code(slipway::exports::artifact_io))]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A project's sources are absent and could not be materialized.
    #[error("sources for project `{project}` unavailable at `{}`: {detail}", path.display())]
    #[diagnostic(code(slipway::sources::unavailable))]
    SourcesUnavailable {
        project: String,
        path: PathBuf,
        detail: String,
    },

    /// The execution engine rejected a node or edge request.
    #[error("execution engine request failed")]
    #[diagnostic(code(slipway::engine::request_failed))]
    Engine(#[source] anyhow::Error),
}

impl BuildError {
    /// Convert to a user-facing diagnostic with context and suggestions.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::ToolsetNotFound { toolset, project } => {
                Diagnostic::error(format!("toolset `{}` not found", toolset))
                    .with_context(format!(
                        "looked in project `{}` and every parent scope up to the solution",
                        project
                    ))
                    .with_suggestion(format!(
                        "Register the toolset on `{}` or an ancestor before creating the action",
                        project
                    ))
            }

            BuildError::DuplicateToolset { toolset, scope } => {
                Diagnostic::error(format!(
                    "toolset `{}` registered twice in scope `{}`",
                    toolset, scope
                ))
                .with_suggestion("Use a distinct name, or register the variant on a child project")
            }

            BuildError::InvalidArgument { what, detail } => {
                Diagnostic::error(format!("invalid argument for {}", what))
                    .with_context(detail.clone())
            }

            BuildError::NotSubmitted { action } => {
                Diagnostic::error(format!("action `{}` is not submitted", action))
                    .with_context(
                        "dependency edges are declared against engine nodes, which only exist after submission",
                    )
                    .with_suggestion("Submit the solution before declaring dependencies")
            }

            BuildError::AlreadySubmitted { action } => {
                Diagnostic::error(format!("action `{}` was already submitted", action))
                    .with_suggestion("Each action may be submitted exactly once")
            }

            BuildError::UnsupportedBackend { backend } => {
                Diagnostic::error(format!("unsupported backend `{}`", backend))
                    .with_context("supported backends: gcc, clang, clang-cl, msvc")
            }

            BuildError::UnmappedOptionValue {
                backend,
                option,
                value,
            } => Diagnostic::error(format!(
                "option `{}` value `{}` cannot be rendered for backend `{}`",
                option, value, backend
            ))
            .with_suggestion("Pick a value the backend supports, or leave the option at its default"),

            BuildError::ToolNotFound { tool } => {
                Diagnostic::error(format!("required tool `{}` not found", tool))
                    .with_suggestion("Run from an environment where the toolchain is on PATH")
            }

            BuildError::ExternalToolFailure {
                tool,
                object,
                detail,
            } => Diagnostic::error(format!("`{}` failed for `{}`", tool, object.display()))
                .with_context(detail.clone()),

            BuildError::ArtifactIo { path, source } => {
                Diagnostic::error(format!("artifact I/O failed for `{}`", path.display()))
                    .with_context(source.to_string())
            }

            BuildError::SourcesUnavailable {
                project,
                path,
                detail,
            } => Diagnostic::error(format!(
                "sources for project `{}` unavailable at `{}`",
                project,
                path.display()
            ))
            .with_context(detail.clone())
            .with_suggestion("Provide a git URL for the project or place the sources at the path"),

            BuildError::Engine(source) => {
                Diagnostic::error("execution engine request failed").with_context(source.to_string())
            }
        }
    }
}
