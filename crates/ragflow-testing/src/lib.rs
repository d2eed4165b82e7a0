// Test-only fakes favor panicking over propagating errors a real caller
// would never hit.
#![allow(clippy::unwrap_used)]

//! In-memory fakes for exercising the RagFlow pipeline, ingestion, and
//! webhook crates from `#[tokio::test]` integration tests without a
//! database, vector store, or network — mirroring `dashflow-testing`'s
//! mock-first approach to testing DashFlow applications.

mod fake_cache_store;
mod fake_row_store;
mod fake_vector_index;
mod recording_webhook_sink;

pub use fake_cache_store::FakeCacheStore;
pub use fake_row_store::FakeRowStore;
pub use fake_vector_index::FakeVectorIndex;
pub use recording_webhook_sink::{RecordedCall, RecordingWebhookSink};

/// Convenient imports for integration tests.
pub mod prelude {
    pub use crate::{FakeCacheStore, FakeRowStore, FakeVectorIndex, RecordedCall, RecordingWebhookSink};
}
