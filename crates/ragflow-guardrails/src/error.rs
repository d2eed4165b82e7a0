//! Guardrails subsystem error taxonomy.

use ragflow_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GuardrailsError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("invalid scanner pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl From<GuardrailsError> for CoreError {
    fn from(err: GuardrailsError) -> Self {
        match err {
            GuardrailsError::Core(inner) => inner,
            GuardrailsError::InvalidPattern(e) => CoreError::UpstreamUnavailable {
                stage: "guardrails".to_string(),
                message: e.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardrailsError>;
