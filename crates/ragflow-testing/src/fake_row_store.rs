//! An in-memory [`RowStore`]/[`DraftStore`]/[`WebhookStore`] triple backed by
//! a single `parking_lot::RwLock<State>`, mirroring how one database
//! connection backs all three concerns in a real deployment.

use async_trait::async_trait;
use parking_lot::RwLock;
use ragflow_core::{Chunk, CoreError, Delivery, Document, Draft, DraftStore, Escalation, RowStore, Session, UserProfile, Webhook, WebhookEvent, WebhookStore};
use std::collections::HashMap;

#[derive(Default)]
struct State {
    documents: Vec<Document>,
    next_document_id: i64,
    sessions: HashMap<String, Session>,
    escalations: HashMap<String, Escalation>,
    drafts: HashMap<String, Draft>,
    chunks: HashMap<String, Vec<Chunk>>,
    webhooks: HashMap<String, Webhook>,
    deliveries: Vec<Delivery>,
    user_profiles: HashMap<String, UserProfile>,
}

/// Exercises every pipeline stage that touches the row store, the draft
/// staging area, or the webhook registry without a database.
#[derive(Default)]
pub struct FakeRowStore {
    state: RwLock<State>,
}

impl FakeRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every document currently stored, in insertion order. Test-only
    /// inspection hook; production `RowStore` callers never need this.
    pub fn documents(&self) -> Vec<Document> {
        self.state.read().documents.clone()
    }

    /// Seed a user profile so `load_user_profile` can return it.
    pub fn seed_user_profile(&self, profile: UserProfile) {
        self.state.write().user_profiles.insert(profile.user_id.clone(), profile);
    }
}

#[async_trait]
impl RowStore for FakeRowStore {
    async fn find_document_by_content(&self, content: &str) -> Result<Option<Document>, CoreError> {
        Ok(self.state.read().documents.iter().find(|d| d.content == content).cloned())
    }

    async fn insert_document(&self, mut document: Document) -> Result<i64, CoreError> {
        let mut state = self.state.write();
        state.next_document_id += 1;
        let id = state.next_document_id;
        document.id = Some(id);
        state.documents.push(document);
        Ok(id)
    }

    async fn distinct_categories_and_intents(&self) -> Result<Vec<(String, String)>, CoreError> {
        let state = self.state.read();
        let mut pairs: Vec<(String, String)> = state
            .documents
            .iter()
            .filter_map(|d| Some((d.metadata.category.clone()?, d.metadata.intent.clone()?)))
            .collect();
        pairs.sort();
        pairs.dedup();
        Ok(pairs)
    }

    async fn load_session(&self, session_id: &str) -> Result<Option<Session>, CoreError> {
        Ok(self.state.read().sessions.get(session_id).cloned())
    }

    async fn save_session(&self, session: &Session) -> Result<(), CoreError> {
        self.state.write().sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn save_escalation(&self, escalation: &Escalation) -> Result<(), CoreError> {
        self.state.write().escalations.insert(escalation.session_id.clone(), escalation.clone());
        Ok(())
    }

    async fn load_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, CoreError> {
        Ok(self.state.read().user_profiles.get(user_id).cloned())
    }
}

#[async_trait]
impl DraftStore for FakeRowStore {
    async fn get(&self, id: &str) -> Result<Option<Draft>, CoreError> {
        Ok(self.state.read().drafts.get(id).cloned())
    }

    async fn put(&self, draft: Draft) -> Result<(), CoreError> {
        self.state.write().drafts.insert(draft.id.clone(), draft);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let mut state = self.state.write();
        state.drafts.remove(id);
        state.chunks.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Draft>, CoreError> {
        Ok(self.state.read().drafts.values().cloned().collect())
    }

    async fn chunks(&self, draft_id: &str) -> Result<Vec<Chunk>, CoreError> {
        Ok(self.state.read().chunks.get(draft_id).cloned().unwrap_or_default())
    }

    async fn put_chunks(&self, draft_id: &str, chunks: Vec<Chunk>) -> Result<(), CoreError> {
        self.state.write().chunks.insert(draft_id.to_string(), chunks);
        Ok(())
    }
}

#[async_trait]
impl WebhookStore for FakeRowStore {
    async fn put(&self, webhook: Webhook) -> Result<(), CoreError> {
        self.state.write().webhooks.insert(webhook.id.clone(), webhook);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Webhook>, CoreError> {
        Ok(self.state.read().webhooks.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.state.write().webhooks.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Webhook>, CoreError> {
        Ok(self.state.read().webhooks.values().cloned().collect())
    }

    async fn active_subscribers(&self, event: WebhookEvent) -> Result<Vec<Webhook>, CoreError> {
        Ok(self.state.read().webhooks.values().filter(|w| w.active && w.events.contains(&event)).cloned().collect())
    }

    async fn save_delivery(&self, delivery: &Delivery) -> Result<(), CoreError> {
        self.state.write().deliveries.push(delivery.clone());
        Ok(())
    }

    async fn get_delivery(&self, id: &str) -> Result<Option<Delivery>, CoreError> {
        Ok(self.state.read().deliveries.iter().find(|d| d.id == id).cloned())
    }

    async fn list_deliveries(&self, webhook_id: &str) -> Result<Vec<Delivery>, CoreError> {
        let mut deliveries: Vec<Delivery> =
            self.state.read().deliveries.iter().filter(|d| d.webhook_id == webhook_id).cloned().collect();
        deliveries.reverse();
        Ok(deliveries)
    }
}
