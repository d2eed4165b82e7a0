//! Session loading/archiving and the question-answer result cache.

pub mod error;
pub mod fingerprint;
pub mod stages;

pub use error::{Result, SessionError};
pub use fingerprint::{fingerprint, FingerprintScope};
pub use stages::{ArchiveSessionStage, CheckCacheStage, SessionStarterStage, StoreInCacheStage};
