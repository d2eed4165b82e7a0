//! The process-wide taxonomy registry (C12).
//!
//! Grounded in `original_source/app/services/taxonomy.py`: on reload, query
//! the row store for distinct `(category, intent)` pairs actually present
//! in stored document metadata, and publish a sorted snapshot. Rather than a
//! literal global/static (atypical in idiomatic Rust), the registry is a
//! plain struct callers share behind an `Arc` — the same "read-mostly,
//! swapped under a lock" shape spec.md §5 describes, without reaching for
//! process-global mutable state.

use parking_lot::RwLock;
use ragflow_core::{Category, CoreError, Intent, RowStore, TaxonomySnapshot};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Holds the current taxonomy snapshot and knows how to rebuild it from the
/// row store. Reload is idempotent and safe to call at runtime; readers
/// never block a reload and a reload never blocks readers for longer than a
/// pointer swap.
pub struct TaxonomyRegistry {
    snapshot: RwLock<TaxonomySnapshot>,
}

impl TaxonomyRegistry {
    /// An empty registry at version 0, before the first reload.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            snapshot: RwLock::new(TaxonomySnapshot::default()),
        })
    }

    /// The current snapshot, cloned out from behind the lock.
    pub fn current(&self) -> TaxonomySnapshot {
        self.snapshot.read().clone()
    }

    /// Query `store` for every distinct `(category, intent)` pair present in
    /// document metadata, rebuild the sorted category/intent tree, and
    /// publish it. Bumps `version` by one.
    pub async fn reload(&self, store: &dyn RowStore) -> Result<(), CoreError> {
        let pairs = store.distinct_categories_and_intents().await?;

        let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (category, intent) in pairs {
            let intents = by_category.entry(category).or_default();
            if !intents.contains(&intent) {
                intents.push(intent);
            }
        }
        for intents in by_category.values_mut() {
            intents.sort();
        }

        let categories: Vec<Category> = by_category
            .into_iter()
            .map(|(name, intent_names)| Category {
                description: enrichment_text(&name),
                intents: intent_names
                    .into_iter()
                    .map(|intent_name| Intent {
                        description: enrichment_text(&intent_name),
                        requires_handoff: false,
                        name: intent_name,
                    })
                    .collect(),
                name,
            })
            .collect();

        let next_version = self.snapshot.read().version + 1;
        let mut guard = self.snapshot.write();
        *guard = TaxonomySnapshot {
            categories,
            version: next_version,
        };
        Ok(())
    }
}

impl Default for TaxonomyRegistry {
    fn default() -> Self {
        Self {
            snapshot: RwLock::new(TaxonomySnapshot::default()),
        }
    }
}

/// A short, human-readable label used for classifier label embeddings, in
/// the absence of curated descriptions in the row store. Real deployments
/// would source this from a description column; this derives a readable
/// phrase from the label's own name, matching the original's minimal
/// enrichment-map fallback.
fn enrichment_text(label: &str) -> String {
    label.replace(['_', '-'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragflow_core::{Document, Escalation, Session};

    struct FakeStore(Vec<(String, String)>);

    #[async_trait]
    impl RowStore for FakeStore {
        async fn find_document_by_content(&self, _content: &str) -> Result<Option<Document>, CoreError> {
            Ok(None)
        }
        async fn insert_document(&self, _document: Document) -> Result<i64, CoreError> {
            Ok(1)
        }
        async fn distinct_categories_and_intents(&self) -> Result<Vec<(String, String)>, CoreError> {
            Ok(self.0.clone())
        }
        async fn load_session(&self, _session_id: &str) -> Result<Option<Session>, CoreError> {
            Ok(None)
        }
        async fn save_session(&self, _session: &Session) -> Result<(), CoreError> {
            Ok(())
        }
        async fn save_escalation(&self, _escalation: &Escalation) -> Result<(), CoreError> {
            Ok(())
        }
        async fn load_user_profile(&self, _user_id: &str) -> Result<Option<ragflow_core::UserProfile>, CoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn reload_builds_sorted_category_intent_tree() {
        let store = FakeStore(vec![
            ("Shipping".into(), "track_package".into()),
            ("Billing".into(), "refund".into()),
            ("Shipping".into(), "lost_package".into()),
        ]);
        let registry = TaxonomyRegistry::new();
        registry.reload(&store).await.unwrap();
        let snapshot = registry.current();

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.categories.len(), 2);
        let shipping = snapshot.category("Shipping").unwrap();
        assert_eq!(shipping.intents.len(), 2);
        assert_eq!(shipping.intents[0].name, "lost_package");
    }

    #[tokio::test]
    async fn reload_is_idempotent_and_bumps_version() {
        let store = FakeStore(vec![("Shipping".into(), "track".into())]);
        let registry = TaxonomyRegistry::new();
        registry.reload(&store).await.unwrap();
        registry.reload(&store).await.unwrap();
        assert_eq!(registry.current().version, 2);
        assert_eq!(registry.current().categories.len(), 1);
    }
}
