//! Shared data model, reducers, and contracts for the RagFlow pipeline
//! engine.
//!
//! This crate has no knowledge of HTTP, storage backends, or LLM vendors —
//! it defines the `RunState` every stage reads and writes, the reducer
//! semantics that merge partial updates back in, and the contract/config/
//! error types every other workspace crate builds on.

pub mod config;
pub mod contract;
pub mod dialog;
pub mod document;
pub mod draft;
pub mod envelope;
pub mod error;
pub mod ports;
pub mod reducers;
pub mod run_state;
pub mod session;
pub mod taxonomy;
pub mod webhook;

pub use config::{
    CacheConfig, DialogConfig, IngestionConfig, PipelineConfig, RetrievalConfig, SessionConfig,
};
pub use contract::StageContract;
pub use dialog::{ActionRecommendation, DialogState, StateBehavior};
pub use document::{Document, DocumentMetadata, ScoredDocument};
pub use draft::{Chunk, Draft, DraftStatus};
pub use error::{CoreError, Result};
pub use ports::{
    CacheStore, CachedAnswer, DraftStore, Embedder, LexicalIndex, QueryExpander, Reranker,
    RowStore, VectorIndex, WebhookSink, WebhookStore,
};
pub use run_state::{
    Action, CacheReason, DialogAnalysis, EscalationReason, GuardrailOutcome, Message,
    PartialRunState, Role, RunState, Sentiment, SentimentLabel,
};
pub use session::{Escalation, EscalationPriority, EscalationStatus, Session, SessionStatus, UserProfile};
pub use taxonomy::{Category, Intent, TaxonomySnapshot};
pub use webhook::{Delivery, DeliveryOutcome, Webhook, WebhookEvent};
