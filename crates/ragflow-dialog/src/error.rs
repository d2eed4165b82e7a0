//! Dialog subsystem error taxonomy.

use ragflow_core::CoreError;
use thiserror::Error;

/// Errors specific to dialog analysis, the rules engine, and routing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DialogError {
    /// The underlying store/model call failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A rule or dynamic rule referenced a `target_state` name the
    /// [`ragflow_core::DialogState`] parser does not recognize.
    #[error("rules engine: unknown dialog state `{0}`")]
    UnknownState(String),
}

impl From<DialogError> for CoreError {
    fn from(err: DialogError) -> Self {
        match err {
            DialogError::Core(inner) => inner,
            DialogError::UnknownState(name) => CoreError::UpstreamUnavailable {
                stage: "state_machine".to_string(),
                message: format!("unknown dialog state `{name}` in rules configuration"),
            },
        }
    }
}

/// Convenience alias for dialog results.
pub type Result<T> = std::result::Result<T, DialogError>;
