//! Taxonomy registry projection types.
//!
//! The registry itself (load/reload/rename) lives in `ragflow-retrieval`;
//! these are the shared value types, grounded in
//! `original_source/app/services/taxonomy.py`'s `Category`/`Intent` records.

use serde::{Deserialize, Serialize};

/// One category in the support taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Canonical category name, used as the metadata filter value.
    pub name: String,
    /// Human-readable description used in classification prompts.
    pub description: String,
    /// Intents that fall under this category.
    pub intents: Vec<Intent>,
}

/// One intent within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Canonical intent name.
    pub name: String,
    /// Human-readable description used in classification prompts.
    pub description: String,
    /// Whether a match on this intent always requires human handoff.
    #[serde(default)]
    pub requires_handoff: bool,
}

/// A point-in-time snapshot of the full taxonomy, as handed to stages that
/// need it (classification, retrieval filtering).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    /// All categories currently active.
    pub categories: Vec<Category>,
    /// Monotonically increasing version, bumped on every reload.
    pub version: u64,
}

impl TaxonomySnapshot {
    /// Find a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Find an intent by category and intent name.
    pub fn intent(&self, category: &str, intent: &str) -> Option<&Intent> {
        self.category(category)?.intents.iter().find(|i| i.name == intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TaxonomySnapshot {
        TaxonomySnapshot {
            categories: vec![Category {
                name: "Shipping".into(),
                description: "Shipping and delivery questions".into(),
                intents: vec![Intent {
                    name: "track_package".into(),
                    description: "Where is my package".into(),
                    requires_handoff: false,
                }],
            }],
            version: 1,
        }
    }

    #[test]
    fn looks_up_category_and_intent_by_name() {
        let snap = sample();
        assert!(snap.category("Shipping").is_some());
        assert!(snap.intent("Shipping", "track_package").is_some());
        assert!(snap.intent("Shipping", "missing").is_none());
        assert!(snap.category("Billing").is_none());
    }
}
