//! Retrieval subsystem error taxonomy.

use ragflow_core::CoreError;
use thiserror::Error;

/// Errors specific to retrieval, classification, and the taxonomy registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RetrievalError {
    /// The underlying store/model call failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The taxonomy registry has not been loaded yet.
    #[error("taxonomy registry has not been initialized")]
    TaxonomyNotLoaded,
}

impl From<RetrievalError> for CoreError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Core(inner) => inner,
            RetrievalError::TaxonomyNotLoaded => CoreError::UpstreamUnavailable {
                stage: "classification".to_string(),
                message: "taxonomy registry has not been initialized".to_string(),
            },
        }
    }
}

/// Convenience alias for retrieval results.
pub type Result<T> = std::result::Result<T, RetrievalError>;
