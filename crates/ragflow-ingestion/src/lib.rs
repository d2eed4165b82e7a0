//! Draft staging CRUD and the staging-to-commit batched embed + dual-store
//! write (spec §4.10).

pub mod commit;
pub mod error;
pub mod staging;

pub use commit::{ChunkOutcome, CommitService, CommitSummary};
pub use error::{IngestionError, Result};
pub use staging::{ChunkCreate, ChunkUpdate, DraftService};
