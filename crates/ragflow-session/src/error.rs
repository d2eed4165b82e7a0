//! Session/cache subsystem error taxonomy.

use ragflow_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<SessionError> for CoreError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Core(inner) => inner,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
