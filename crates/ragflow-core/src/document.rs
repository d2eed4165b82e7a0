//! The retrieval unit and its metadata contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single document in the knowledge base: a dense embedding plus metadata
/// used by classification, filtering, and the dialog state machine.
///
/// Invariants (enforced by callers that construct documents — the type itself
/// cannot check the embedding dimension against a configured size):
/// - `content` is non-empty.
/// - `embedding.len()` equals the collection's configured vector dimension.
/// - `content` is unique within a collection; duplicates are skipped on
///   ingest (see `ragflow-ingestion`), not rejected here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Row-store primary key. Assigned on insert; `None` before persistence.
    pub id: Option<i64>,
    /// The raw text content of the document.
    pub content: String,
    /// Dense embedding vector, fixed dimension across a collection.
    pub embedding: Vec<f32>,
    /// Free-form metadata. Known keys used by the pipeline are accessed via
    /// the typed helpers below.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Construct a new unpersisted document.
    pub fn new(content: impl Into<String>, embedding: Vec<f32>, metadata: DocumentMetadata) -> Self {
        Self {
            id: None,
            content: content.into(),
            embedding,
            metadata,
        }
    }

    /// True if `content` is non-empty, satisfying the ingest invariant.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// The metadata fields the pipeline reads off a document. Extra keys a
/// backend may carry are preserved in `extra` for round-tripping but are not
/// interpreted by any stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// Taxonomy category this document belongs to, if classified.
    pub category: Option<String>,
    /// Taxonomy intent this document answers, if classified.
    pub intent: Option<String>,
    /// Whether a match against this document should always be handed off to
    /// a human regardless of confidence (e.g. billing disputes).
    #[serde(default)]
    pub requires_handoff: bool,
    /// Per-document confidence threshold override, if any. Falls back to the
    /// pipeline default when `None`.
    pub confidence_threshold: Option<f32>,
    /// Clarifying questions to ask the user before answering from this
    /// document, if retrieval should branch to clarification instead of
    /// generation.
    #[serde(default)]
    pub clarifying_questions: Vec<String>,
    /// Identifier of the source document/file this chunk was extracted from.
    pub source_document: Option<String>,
    /// Any additional metadata not modeled above.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A scored retrieval hit, produced by the vector, lexical, or fused stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredDocument {
    /// The underlying document.
    pub document: Document,
    /// Score in the scale of the stage that produced it (cosine similarity
    /// for vector search, BM25-like for lexical, reciprocal-rank for fusion,
    /// cross-encoder logit/probability for rerank).
    pub score: f32,
    /// 1-based rank within the list that produced this hit, used for
    /// reciprocal-rank fusion.
    pub rank: usize,
}
