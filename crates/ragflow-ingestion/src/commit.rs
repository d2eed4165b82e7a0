//! The staging→commit protocol (spec §4.10), grounded in
//! `original_source/app/services/ingestion/ingestion_service.py`'s
//! `DocumentIngestionService.ingest_pairs`: batched embed, dedup-by-content
//! row insert, and a reduced-payload vector upsert, then draft deletion on
//! success.
//!
//! §5's at-most-one-concurrent-commit-per-draft policy is enforced with a
//! `DashSet` of in-flight draft ids — a commit already running for a draft
//! is refused rather than queued, matching "refused parallel commit
//! requests."

use crate::error::{IngestionError, Result};
use dashmap::DashSet;
use ragflow_core::{Document, DraftStatus, DraftStore, Embedder, IngestionConfig, RowStore, VectorIndex};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome for one chunk processed during commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Inserted as a new document with this row-store id.
    Inserted(i64),
    /// Skipped because identical content already exists in the row store.
    SkippedDuplicate,
}

/// Summary of one commit call.
#[derive(Debug, Clone, Default)]
pub struct CommitSummary {
    /// Per-chunk outcomes, in the draft's chunk order.
    pub outcomes: Vec<ChunkOutcome>,
    /// Count of chunks actually inserted.
    pub inserted_count: usize,
}

/// Runs the staging→commit protocol against a draft's chunks.
pub struct CommitService {
    drafts: Arc<dyn DraftStore>,
    rows: Arc<dyn RowStore>,
    vectors: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: IngestionConfig,
    committing: DashSet<String>,
}

impl CommitService {
    /// Construct a commit service over the four collaborating stores.
    pub fn new(
        drafts: Arc<dyn DraftStore>,
        rows: Arc<dyn RowStore>,
        vectors: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: IngestionConfig,
    ) -> Self {
        Self { drafts, rows, vectors, embedder, config, committing: DashSet::new() }
    }

    /// Commit every chunk of `draft_id`: validate, ensure the vector
    /// collection exists, batch-embed, dedup-insert into the row store,
    /// upsert into the vector store, then delete the draft on success.
    pub async fn commit(&self, draft_id: &str) -> Result<CommitSummary> {
        if !self.committing.insert(draft_id.to_string()) {
            return Err(IngestionError::AlreadyCommitting(draft_id.to_string()));
        }
        let result = self.commit_inner(draft_id).await;
        self.committing.remove(draft_id);
        result
    }

    async fn commit_inner(&self, draft_id: &str) -> Result<CommitSummary> {
        let Some(draft) = self.drafts.get(draft_id).await? else {
            return Err(IngestionError::DraftNotFound(draft_id.to_string()));
        };
        let chunks = self.drafts.chunks(draft_id).await?;

        for chunk in &chunks {
            if !chunk.has_content() {
                return Err(IngestionError::EmptyChunk(chunk.id.clone()));
            }
        }

        self.vectors.ensure_collection(self.config.vector_dimension).await?;

        let mut summary = CommitSummary::default();
        let batch_size = self.config.embed_batch_size.max(1) as usize;

        for batch in chunks.chunks(batch_size) {
            let contents: Vec<String> = batch.iter().map(|c| c.to_document_content()).collect();
            let embeddings = self.embedder.embed_batch(&contents).await?;

            for ((chunk, content), embedding) in batch.iter().zip(contents).zip(embeddings) {
                if self.rows.find_document_by_content(&content).await?.is_some() {
                    warn!(chunk_id = %chunk.id, "skipping duplicate content during commit");
                    summary.outcomes.push(ChunkOutcome::SkippedDuplicate);
                    continue;
                }

                let document = Document::new(content, embedding.clone(), chunk.metadata.clone());
                let id = self.rows.insert_document(document).await?;

                let payload = serde_json::json!({
                    "category": chunk.metadata.category,
                    "intent": chunk.metadata.intent,
                    "source": "staging_commit",
                });
                self.vectors.upsert(id, embedding, payload).await?;

                summary.outcomes.push(ChunkOutcome::Inserted(id));
                summary.inserted_count += 1;
            }
        }

        let _ = draft;
        self.drafts.delete(draft_id).await?;

        info!(draft_id, inserted = summary.inserted_count, "draft committed");
        Ok(summary)
    }
}
