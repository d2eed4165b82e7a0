//! `easy_classification` and `classification` stages: both wrap
//! [`SemanticClassifier`], differing only in whether a confidence-threshold
//! fallback substitution applies.

use crate::classification::SemanticClassifier;
use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

/// Confidence-threshold fallback labels used by the `easy_classification`
/// fast path (spec.md §4.5 describes only the canonical `classification`
/// stage in detail; `easy_classification`'s threshold/fallback behavior is
/// carried over from `original_source/app/nodes/easy_classification/node.py`).
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    /// Minimum confidence required to keep the classifier's intent.
    pub intent_confidence_threshold: f32,
    /// Minimum confidence required to keep the classifier's category.
    pub category_confidence_threshold: f32,
    /// Intent substituted when confidence is below threshold.
    pub fallback_intent: String,
    /// Category substituted when confidence is below threshold.
    pub fallback_category: String,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            intent_confidence_threshold: 0.3,
            category_confidence_threshold: 0.3,
            fallback_intent: "unknown".to_string(),
            fallback_category: "General".to_string(),
        }
    }
}

/// A classification stage: embeds the query once, asks the classifier for
/// its top category/intent, and optionally substitutes fallback labels
/// below a confidence threshold.
pub struct ClassificationStage {
    name: &'static str,
    classifier: Arc<dyn SemanticClassifier>,
    fallback: Option<FallbackPolicy>,
}

impl ClassificationStage {
    /// The canonical `classification` stage: no fallback substitution,
    /// matching `original_source/app/nodes/classification/node.py`.
    pub fn canonical(classifier: Arc<dyn SemanticClassifier>) -> Self {
        Self {
            name: "classification",
            classifier,
            fallback: None,
        }
    }

    /// The `easy_classification` fast path: substitutes `fallback` labels
    /// below the configured confidence thresholds.
    pub fn easy(classifier: Arc<dyn SemanticClassifier>, fallback: FallbackPolicy) -> Self {
        Self {
            name: "easy_classification",
            classifier,
            fallback: Some(fallback),
        }
    }
}

#[async_trait]
impl Stage for ClassificationStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec!["aggregated_query", "translated_query", "question"],
            guaranteed_outputs: vec!["category", "intent"],
            conditional_outputs: vec!["category_confidence", "intent_confidence"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let query = state
            .translated_query
            .as_deref()
            .or(state.aggregated_query.as_deref())
            .unwrap_or(&state.question);

        let result = self.classifier.classify(query).await?;

        let mut partial = PartialRunState::default();
        match (result, &self.fallback) {
            (Some(result), Some(policy)) => {
                let intent = if result.intent_confidence >= policy.intent_confidence_threshold {
                    result.intent
                } else {
                    Some(policy.fallback_intent.clone())
                };
                let category = if result.category_confidence >= policy.category_confidence_threshold {
                    result.category
                } else {
                    Some(policy.fallback_category.clone())
                };
                partial.intent = Some(intent);
                partial.category = Some(category);
                partial.intent_confidence = Some(Some(result.intent_confidence));
                partial.category_confidence = Some(Some(result.category_confidence));
            }
            (Some(result), None) => {
                partial.intent = Some(result.intent);
                partial.category = Some(result.category);
                partial.intent_confidence = Some(Some(result.intent_confidence));
                partial.category_confidence = Some(Some(result.category_confidence));
            }
            (None, Some(policy)) => {
                partial.intent = Some(Some(policy.fallback_intent.clone()));
                partial.category = Some(Some(policy.fallback_category.clone()));
            }
            (None, None) => {
                partial.intent = Some(None);
                partial.category = Some(None);
            }
        }
        partial.matched_intent = partial.intent.clone();
        partial.matched_category = partial.category.clone();

        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ClassificationResult;

    struct FixedClassifier(Option<ClassificationResult>);

    #[async_trait]
    impl SemanticClassifier for FixedClassifier {
        async fn classify(&self, _query: &str) -> Result<Option<ClassificationResult>, CoreError> {
            Ok(self.0.clone())
        }
        async fn refresh(&self, _taxonomy: &ragflow_core::TaxonomySnapshot) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn easy_classification_substitutes_fallback_below_threshold() {
        let classifier = FixedClassifier(Some(ClassificationResult {
            category: Some("Shipping".into()),
            category_confidence: 0.1,
            intent: Some("track".into()),
            intent_confidence: 0.9,
        }));
        let stage = ClassificationStage::easy(Arc::new(classifier), FallbackPolicy::default());
        let partial = stage.execute(&RunState::new("hi")).await.unwrap();
        assert_eq!(partial.category, Some(Some("General".to_string())));
        assert_eq!(partial.intent, Some(Some("track".to_string())));
    }

    #[tokio::test]
    async fn canonical_classification_never_substitutes() {
        let classifier = FixedClassifier(Some(ClassificationResult {
            category: Some("Shipping".into()),
            category_confidence: 0.01,
            intent: Some("track".into()),
            intent_confidence: 0.01,
        }));
        let stage = ClassificationStage::canonical(Arc::new(classifier));
        let partial = stage.execute(&RunState::new("hi")).await.unwrap();
        assert_eq!(partial.category, Some(Some("Shipping".to_string())));
    }
}
