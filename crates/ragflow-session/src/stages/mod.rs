//! Session lifecycle and result-cache pipeline stages.

pub mod archive_session;
pub mod check_cache;
pub mod session_starter;
pub mod store_in_cache;

pub use archive_session::ArchiveSessionStage;
pub use check_cache::CheckCacheStage;
pub use session_starter::SessionStarterStage;
pub use store_in_cache::StoreInCacheStage;
