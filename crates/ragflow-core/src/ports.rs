//! Trait boundaries ("ports") to every external collaborator spec.md §1
//! deliberately keeps contract-only: the row store, the vector store, the
//! cache, embedding/rerank models, and the webhook HTTP client.
//!
//! No concrete backend lives in this workspace. `ragflow-testing` provides
//! in-memory fakes for every trait here so the domain crates' stages can be
//! exercised deterministically. This mirrors `dashflow::core`'s
//! `vector_stores::VectorStore` / `retrievers::Retriever` split between
//! abstract interface and concrete integration crate (`dashflow-qdrant`).

use crate::document::{Document, DocumentMetadata, ScoredDocument};
use crate::draft::{Chunk, Draft};
use crate::error::CoreError;
use crate::session::{Escalation, Session, UserProfile};
use crate::webhook::{Delivery, Webhook, WebhookEvent};
use async_trait::async_trait;

/// Dense kNN search over a document collection, optionally filtered by
/// taxonomy category.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the top `top_k` nearest documents to `embedding`.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        category: Option<&str>,
    ) -> Result<Vec<ScoredDocument>, CoreError>;

    /// Insert or replace the vector point for `id` with a reduced payload.
    async fn upsert(&self, id: i64, embedding: Vec<f32>, payload: serde_json::Value) -> Result<(), CoreError>;

    /// Ensure the backing collection exists with the given vector dimension
    /// and cosine distance metric, creating it if missing.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), CoreError>;
}

/// Full-text search over the row store.
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    /// Return the top `top_k` documents by BM25-like score for `query` in
    /// the named language's FTS index.
    async fn search(&self, query: &str, top_k: usize, language: &str) -> Result<Vec<ScoredDocument>, CoreError>;
}

/// The durable document/session/message store.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Look up a document by exact content match, used for ingest dedup.
    async fn find_document_by_content(&self, content: &str) -> Result<Option<Document>, CoreError>;

    /// Insert a new document, returning its assigned id.
    async fn insert_document(&self, document: Document) -> Result<i64, CoreError>;

    /// `SELECT DISTINCT category, intent FROM documents WHERE category IS
    /// NOT NULL`, used to rebuild the taxonomy registry.
    async fn distinct_categories_and_intents(&self) -> Result<Vec<(String, String)>, CoreError>;

    /// Load a session by id, if it exists.
    async fn load_session(&self, session_id: &str) -> Result<Option<Session>, CoreError>;

    /// Create or overwrite a session row.
    async fn save_session(&self, session: &Session) -> Result<(), CoreError>;

    /// Write an escalation record, upserting by `session_id`.
    async fn save_escalation(&self, escalation: &Escalation) -> Result<(), CoreError>;

    /// Load a known user's profile, if one exists. `session_starter` calls
    /// this optionally (spec.md §4.8); most sessions have no resolved
    /// identity and this returns `None`.
    async fn load_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, CoreError>;
}

/// A cached answer, keyed by question fingerprint.
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    /// The previously generated answer text.
    pub answer: String,
    /// The confidence recorded at generation time.
    pub confidence: f32,
    /// The top document's metadata at generation time.
    pub best_doc_metadata: Option<DocumentMetadata>,
    /// The question embedding stored alongside the entry, used for semantic
    /// lookups against future questions.
    pub embedding: Option<Vec<f32>>,
}

/// The result cache (C9).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Exact-match lookup by fingerprint key.
    async fn get(&self, key: &str) -> Result<Option<CachedAnswer>, CoreError>;

    /// Write an entry back with a bounded TTL.
    async fn set(&self, key: &str, value: CachedAnswer, ttl_seconds: i64) -> Result<(), CoreError>;

    /// Semantic lookup: the closest stored entry whose embedding similarity
    /// to `embedding` exceeds `threshold`, if any.
    async fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<(String, CachedAnswer)>, CoreError>;
}

/// Turns text into dense embeddings. CPU-bound implementations are expected
/// to dispatch internally (`spawn_blocking`, a `rayon` pool, or a remote
/// call) without blocking the calling task for long periods (spec.md §5).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError>;

    /// Embed a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError>;
}

/// Cross-encoder scoring of (query, document) pairs.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score every candidate against `query`, aligned index-for-index with
    /// `candidates`.
    async fn score(&self, query: &str, candidates: &[ScoredDocument]) -> Result<Vec<f32>, CoreError>;
}

/// Generates paraphrased query expansions for fan-out sub-search.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Produce up to `max_expansions` paraphrases of `query`.
    async fn expand(&self, query: &str, max_expansions: usize) -> Result<Vec<String>, CoreError>;
}

/// Sends a signed, already-constructed webhook delivery attempt.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Deliver one attempt of `event_id`/`event_type` with `payload` to
    /// `webhook`, returning the resulting delivery record. `event_id` is
    /// preserved across retries; `attempt` increments on each one.
    async fn deliver(
        &self,
        webhook: &Webhook,
        event_id: &str,
        event_type: &str,
        payload: serde_json::Value,
        attempt: u32,
    ) -> Result<Delivery, CoreError>;
}

/// The staging area for documents awaiting review and commit.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Fetch a draft by id.
    async fn get(&self, id: &str) -> Result<Option<Draft>, CoreError>;

    /// Create or overwrite a draft.
    async fn put(&self, draft: Draft) -> Result<(), CoreError>;

    /// Delete a draft and its chunks.
    async fn delete(&self, id: &str) -> Result<(), CoreError>;

    /// List every currently staged draft.
    async fn list(&self) -> Result<Vec<Draft>, CoreError>;

    /// List the chunks belonging to a draft.
    async fn chunks(&self, draft_id: &str) -> Result<Vec<Chunk>, CoreError>;

    /// Replace a draft's chunk list.
    async fn put_chunks(&self, draft_id: &str, chunks: Vec<Chunk>) -> Result<(), CoreError>;
}

/// Registration and delivery-history storage for webhooks (spec §6's
/// `webhooks` and `webhook_deliveries` tables). Separate from
/// [`WebhookSink`], which only performs one HTTP delivery attempt.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// Create or overwrite a webhook registration.
    async fn put(&self, webhook: Webhook) -> Result<(), CoreError>;

    /// Fetch a webhook registration by id.
    async fn get(&self, id: &str) -> Result<Option<Webhook>, CoreError>;

    /// Remove a webhook registration.
    async fn delete(&self, id: &str) -> Result<(), CoreError>;

    /// List every registered webhook.
    async fn list(&self) -> Result<Vec<Webhook>, CoreError>;

    /// List active webhooks subscribed to `event`.
    async fn active_subscribers(&self, event: WebhookEvent) -> Result<Vec<Webhook>, CoreError>;

    /// Append a delivery attempt to a webhook's history.
    async fn save_delivery(&self, delivery: &Delivery) -> Result<(), CoreError>;

    /// Fetch a single delivery attempt by its own id.
    async fn get_delivery(&self, id: &str) -> Result<Option<Delivery>, CoreError>;

    /// List every delivery attempt recorded for a webhook, most recent
    /// first.
    async fn list_deliveries(&self, webhook_id: &str) -> Result<Vec<Delivery>, CoreError>;
}
