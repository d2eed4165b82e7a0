//! Ingestion subsystem error taxonomy.

use ragflow_core::CoreError;
use thiserror::Error;

/// Errors specific to draft staging and the commit protocol.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestionError {
    /// The underlying store/model call failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The named draft does not exist in the staging store.
    #[error("draft `{0}` not found")]
    DraftNotFound(String),

    /// The named chunk does not exist within the named draft.
    #[error("chunk `{chunk_id}` not found in draft `{draft_id}`")]
    ChunkNotFound {
        /// The draft searched.
        draft_id: String,
        /// The missing chunk id.
        chunk_id: String,
    },

    /// A chunk had an empty question or answer at commit time.
    #[error("chunk `{0}` has an empty question or answer")]
    EmptyChunk(String),

    /// A commit for this draft is already in progress.
    #[error("draft `{0}` is already committing")]
    AlreadyCommitting(String),
}

impl From<IngestionError> for CoreError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Core(inner) => inner,
            IngestionError::DraftNotFound(id) => CoreError::UpstreamUnavailable {
                stage: "ingestion_commit".to_string(),
                message: format!("draft `{id}` not found"),
            },
            IngestionError::ChunkNotFound { draft_id, chunk_id } => CoreError::UpstreamUnavailable {
                stage: "ingestion_commit".to_string(),
                message: format!("chunk `{chunk_id}` not found in draft `{draft_id}`"),
            },
            IngestionError::EmptyChunk(id) => CoreError::UpstreamUnavailable {
                stage: "ingestion_commit".to_string(),
                message: format!("chunk `{id}` has an empty question or answer"),
            },
            IngestionError::AlreadyCommitting(id) => CoreError::UpstreamUnavailable {
                stage: "ingestion_commit".to_string(),
                message: format!("draft `{id}` is already committing"),
            },
        }
    }
}

/// Convenience alias for ingestion results.
pub type Result<T> = std::result::Result<T, IngestionError>;
