//! Draft CRUD over the staging area (spec §4.10, grounded in
//! `original_source/app/services/staging.py`'s `StagingService`).
//!
//! The Python original keeps one JSON blob per draft (header + chunk list)
//! in Redis. [`DraftStore`] models the same shape as two collections
//! (`Draft` header, `Vec<Chunk>`) so a concrete backend can update a single
//! chunk without rewriting the whole blob; `DraftService` is the thin
//! façade the API layer would call, matching `StagingService`'s method set.

use crate::error::{IngestionError, Result};
use ragflow_core::{Chunk, Draft, DraftStatus, DraftStore, DocumentMetadata};
use std::sync::Arc;

/// A chunk to stage, as supplied by a file extractor or a manual draft
/// creation request.
#[derive(Debug, Clone)]
pub struct ChunkCreate {
    /// The proposed question text.
    pub question: String,
    /// The proposed answer text.
    pub answer: String,
    /// Proposed metadata.
    pub metadata: DocumentMetadata,
}

/// A partial update to an existing chunk. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ChunkUpdate {
    /// Replacement question text, if provided.
    pub question: Option<String>,
    /// Replacement answer text, if provided.
    pub answer: Option<String>,
    /// A shallow JSON patch merged into the chunk's existing metadata,
    /// mirroring `current_meta.update(new)` in the Python original.
    pub metadata_patch: Option<serde_json::Value>,
}

fn merge_metadata(current: &DocumentMetadata, patch: &serde_json::Value) -> Result<DocumentMetadata> {
    let mut value = serde_json::to_value(current).map_err(|e| IngestionError::Core(e.into()))?;
    if let (Some(base), Some(patch)) = (value.as_object_mut(), patch.as_object()) {
        for (key, val) in patch {
            base.insert(key.clone(), val.clone());
        }
    }
    serde_json::from_value(value).map_err(|e| IngestionError::Core(e.into()))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Façade over [`DraftStore`] implementing the staging draft/chunk CRUD
/// surface spec §4.10 requires: create, list/search, single-draft read,
/// chunk add/update/batch-metadata-update/delete, draft delete, clear-all.
pub struct DraftService {
    store: Arc<dyn DraftStore>,
    ttl_days: i64,
}

impl DraftService {
    /// `ttl_days` is the draft lifetime used for newly created drafts
    /// (spec §4.10 default 7 days via `IngestionConfig`).
    pub fn new(store: Arc<dyn DraftStore>, ttl_days: i64) -> Self {
        Self { store, ttl_days }
    }

    /// Create a draft from a filename/`file_id` (file upload) or from a
    /// direct chunk list (manual draft creation) — both paths converge on
    /// this one constructor, matching `create_draft` being called from both
    /// `upload_file` and the manual-draft endpoint in the original.
    pub async fn create_draft(
        &self,
        filename: String,
        file_id: Option<String>,
        chunks: Vec<ChunkCreate>,
    ) -> Result<(Draft, Vec<Chunk>)> {
        let now = chrono::Utc::now();
        let draft = Draft {
            id: new_id(),
            file_id,
            filename,
            status: DraftStatus::Draft,
            created_at: now,
            expires_at: now + chrono::Duration::days(self.ttl_days),
        };
        let staged: Vec<Chunk> = chunks
            .into_iter()
            .map(|c| Chunk {
                id: new_id(),
                draft_id: draft.id.clone(),
                question: c.question,
                answer: c.answer,
                metadata: c.metadata,
            })
            .collect();
        self.store.put(draft.clone()).await?;
        self.store.put_chunks(&draft.id, staged.clone()).await?;
        Ok((draft, staged))
    }

    /// Fetch a draft and its chunks.
    pub async fn get_draft(&self, draft_id: &str) -> Result<Option<(Draft, Vec<Chunk>)>> {
        let Some(draft) = self.store.get(draft_id).await? else {
            return Ok(None);
        };
        let chunks = self.store.chunks(draft_id).await?;
        Ok(Some((draft, chunks)))
    }

    /// List drafts, optionally restricted to `draft_ids` and/or filtered by
    /// a case-insensitive `search` substring against the filename.
    pub async fn list_drafts(&self, draft_ids: Option<&[String]>, search: Option<&str>) -> Result<Vec<(Draft, Vec<Chunk>)>> {
        let mut drafts = self.store.list().await?;
        if let Some(ids) = draft_ids {
            drafts.retain(|d| ids.iter().any(|id| id == &d.id));
        }
        if let Some(term) = search {
            let term = term.to_lowercase();
            drafts.retain(|d| d.filename.to_lowercase().contains(&term));
        }
        let mut out = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let chunks = self.store.chunks(&draft.id).await?;
            out.push((draft, chunks));
        }
        Ok(out)
    }

    /// Append chunks to an existing draft.
    pub async fn add_chunks(&self, draft_id: &str, chunks: Vec<ChunkCreate>) -> Result<Vec<Chunk>> {
        if self.store.get(draft_id).await?.is_none() {
            return Err(IngestionError::DraftNotFound(draft_id.to_string()));
        }
        let mut existing = self.store.chunks(draft_id).await?;
        existing.extend(chunks.into_iter().map(|c| Chunk {
            id: new_id(),
            draft_id: draft_id.to_string(),
            question: c.question,
            answer: c.answer,
            metadata: c.metadata,
        }));
        self.store.put_chunks(draft_id, existing.clone()).await?;
        Ok(existing)
    }

    /// Apply a full field update (question/answer/metadata) to one chunk.
    pub async fn update_chunk(&self, draft_id: &str, chunk_id: &str, update: ChunkUpdate) -> Result<Chunk> {
        let mut chunks = self.store.chunks(draft_id).await?;
        let Some(chunk) = chunks.iter_mut().find(|c| c.id == chunk_id) else {
            return Err(IngestionError::ChunkNotFound {
                draft_id: draft_id.to_string(),
                chunk_id: chunk_id.to_string(),
            });
        };
        if let Some(question) = update.question {
            chunk.question = question;
        }
        if let Some(answer) = update.answer {
            chunk.answer = answer;
        }
        if let Some(patch) = update.metadata_patch {
            chunk.metadata = merge_metadata(&chunk.metadata, &patch)?;
        }
        let updated = chunk.clone();
        self.store.put_chunks(draft_id, chunks).await?;
        Ok(updated)
    }

    /// Merge a metadata patch into every named chunk in one write, mirroring
    /// `update_chunk_metadata_batch`.
    pub async fn update_chunks_metadata_batch(
        &self,
        draft_id: &str,
        updates: Vec<(String, serde_json::Value)>,
    ) -> Result<Vec<Chunk>> {
        let mut chunks = self.store.chunks(draft_id).await?;
        if chunks.is_empty() && self.store.get(draft_id).await?.is_none() {
            return Err(IngestionError::DraftNotFound(draft_id.to_string()));
        }
        for (chunk_id, patch) in &updates {
            if let Some(chunk) = chunks.iter_mut().find(|c| &c.id == chunk_id) {
                chunk.metadata = merge_metadata(&chunk.metadata, patch)?;
            }
        }
        self.store.put_chunks(draft_id, chunks.clone()).await?;
        Ok(chunks)
    }

    /// Remove one chunk from a draft.
    pub async fn delete_chunk(&self, draft_id: &str, chunk_id: &str) -> Result<()> {
        let mut chunks = self.store.chunks(draft_id).await?;
        let before = chunks.len();
        chunks.retain(|c| c.id != chunk_id);
        if chunks.len() == before {
            return Err(IngestionError::ChunkNotFound {
                draft_id: draft_id.to_string(),
                chunk_id: chunk_id.to_string(),
            });
        }
        self.store.put_chunks(draft_id, chunks).await?;
        Ok(())
    }

    /// Delete a draft and its chunks.
    pub async fn delete_draft(&self, draft_id: &str) -> Result<()> {
        if self.store.get(draft_id).await?.is_none() {
            return Err(IngestionError::DraftNotFound(draft_id.to_string()));
        }
        self.store.delete(draft_id).await?;
        Ok(())
    }

    /// Delete every staged draft, returning the count removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let drafts = self.store.list().await?;
        let count = drafts.len();
        for draft in drafts {
            self.store.delete(&draft.id).await?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragflow_core::CoreError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        drafts: Mutex<HashMap<String, Draft>>,
        chunks: Mutex<HashMap<String, Vec<Chunk>>>,
    }

    #[async_trait]
    impl DraftStore for FakeStore {
        async fn get(&self, id: &str) -> std::result::Result<Option<Draft>, CoreError> {
            Ok(self.drafts.lock().unwrap().get(id).cloned())
        }
        async fn put(&self, draft: Draft) -> std::result::Result<(), CoreError> {
            self.drafts.lock().unwrap().insert(draft.id.clone(), draft);
            Ok(())
        }
        async fn delete(&self, id: &str) -> std::result::Result<(), CoreError> {
            self.drafts.lock().unwrap().remove(id);
            self.chunks.lock().unwrap().remove(id);
            Ok(())
        }
        async fn list(&self) -> std::result::Result<Vec<Draft>, CoreError> {
            Ok(self.drafts.lock().unwrap().values().cloned().collect())
        }
        async fn chunks(&self, draft_id: &str) -> std::result::Result<Vec<Chunk>, CoreError> {
            Ok(self.chunks.lock().unwrap().get(draft_id).cloned().unwrap_or_default())
        }
        async fn put_chunks(&self, draft_id: &str, chunks: Vec<Chunk>) -> std::result::Result<(), CoreError> {
            self.chunks.lock().unwrap().insert(draft_id.to_string(), chunks);
            Ok(())
        }
    }

    fn sample_chunk(question: &str) -> ChunkCreate {
        ChunkCreate {
            question: question.to_string(),
            answer: "An answer.".to_string(),
            metadata: DocumentMetadata::default(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_chunks() {
        let service = DraftService::new(Arc::new(FakeStore::default()), 7);
        let (draft, chunks) = service
            .create_draft("faq.json".to_string(), None, vec![sample_chunk("How do I reset my password?")])
            .await
            .unwrap();

        let (loaded, loaded_chunks) = service.get_draft(&draft.id).await.unwrap().unwrap();
        assert_eq!(loaded.filename, "faq.json");
        assert_eq!(loaded_chunks.len(), chunks.len());
    }

    #[tokio::test]
    async fn update_chunk_merges_metadata_patch() {
        let service = DraftService::new(Arc::new(FakeStore::default()), 7);
        let (draft, chunks) = service
            .create_draft("faq.json".to_string(), None, vec![sample_chunk("q")])
            .await
            .unwrap();
        let chunk_id = chunks[0].id.clone();

        let update = ChunkUpdate {
            question: None,
            answer: None,
            metadata_patch: Some(serde_json::json!({"category": "Account Access"})),
        };
        let updated = service.update_chunk(&draft.id, &chunk_id, update).await.unwrap();
        assert_eq!(updated.metadata.category.as_deref(), Some("Account Access"));
    }

    #[tokio::test]
    async fn delete_chunk_on_unknown_id_is_an_error() {
        let service = DraftService::new(Arc::new(FakeStore::default()), 7);
        let (draft, _) = service.create_draft("faq.json".to_string(), None, vec![sample_chunk("q")]).await.unwrap();
        let err = service.delete_chunk(&draft.id, "nope").await.unwrap_err();
        assert!(matches!(err, IngestionError::ChunkNotFound { .. }));
    }

    #[tokio::test]
    async fn search_filters_by_filename_substring() {
        let service = DraftService::new(Arc::new(FakeStore::default()), 7);
        service.create_draft("returns_faq.json".to_string(), None, vec![]).await.unwrap();
        service.create_draft("shipping.csv".to_string(), None, vec![]).await.unwrap();

        let found = service.list_drafts(None, Some("faq")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.filename, "returns_faq.json");
    }

    #[tokio::test]
    async fn clear_all_removes_every_draft() {
        let service = DraftService::new(Arc::new(FakeStore::default()), 7);
        service.create_draft("a.json".to_string(), None, vec![]).await.unwrap();
        service.create_draft("b.json".to_string(), None, vec![]).await.unwrap();

        let cleared = service.clear_all().await.unwrap();
        assert_eq!(cleared, 2);
        assert!(service.list_drafts(None, None).await.unwrap().is_empty());
    }
}
