//! Orchestrator error taxonomy.

use ragflow_core::CoreError;
use thiserror::Error;

/// Errors raised while compiling or executing a pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// A stage was enabled by name in configuration but has no registry
    /// entry. Caught at compile time, never at runtime.
    #[error("stage `{0}` is enabled in configuration but not registered")]
    UnknownStage(String),

    /// Compiling the requested stage set would violate a hard ordering
    /// invariant (spec.md §4.2's five build-time rules).
    #[error("invalid pipeline: {0}")]
    InvalidDag(String),

    /// A stage's declared contract was not satisfied, or it returned a
    /// reducer/state error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A stage failed during execution (propagated from its own logic, not
    /// a contract violation).
    #[error("stage `{stage}` failed: {source}")]
    StageFailed {
        /// Name of the failing stage.
        stage: String,
        /// Underlying cause.
        #[source]
        source: CoreError,
    },
}

/// Convenience alias for pipeline results.
pub type Result<T> = std::result::Result<T, PipelineError>;
