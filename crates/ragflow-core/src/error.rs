//! Shared error taxonomy for the pipeline engine.
//!
//! Every crate in the workspace that can fail defines its own `Error` enum and
//! converts into or out of these core variants via `#[from]`/`#[source]`. This
//! mirrors the per-crate `thiserror` enums used throughout `dashflow` (e.g.
//! `dashflow-memory::base_memory::MemoryError`) rather than a single
//! workspace-wide error type.

use thiserror::Error;

/// Errors raised while materializing or reducing a stage's view of the run
/// state, or while the orchestrator is compiling/executing the DAG.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A stage's declared required input field was absent from the run state.
    #[error("stage `{stage}` is missing required input field(s): {missing:?}")]
    InvalidContract {
        /// Name of the stage that failed to materialize its input.
        stage: String,
        /// Required fields that were absent.
        missing: Vec<String>,
    },

    /// A stage did not complete within its allotted deadline.
    #[error("stage `{stage}` timed out after {elapsed_ms}ms")]
    StageTimeout {
        /// Name of the stage that timed out.
        stage: String,
        /// Elapsed time in milliseconds before the timeout fired.
        elapsed_ms: u64,
    },

    /// A downstream dependency (row store, vector store, cache, LLM) was
    /// unavailable. Degradation policy is decided by the caller, not here.
    #[error("upstream dependency unavailable for stage `{stage}`: {message}")]
    UpstreamUnavailable {
        /// Name of the stage whose dependency failed.
        stage: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// The request was cancelled before completion.
    #[error("request cancelled")]
    Cancelled,

    /// Serialization/deserialization of a run-state field failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for results produced by core run-state operations.
pub type Result<T> = std::result::Result<T, CoreError>;
