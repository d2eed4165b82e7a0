//! `metadata_filtering` stage: decides whether retrieval should be
//! restricted to the classified category.

use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;

/// Applies the filter when `category_confidence` meets `high_threshold`;
/// otherwise falls back to unfiltered search and records why.
pub struct MetadataFilteringStage {
    high_threshold: f32,
}

impl MetadataFilteringStage {
    /// Construct a new stage with the given high-confidence threshold.
    pub fn new(high_threshold: f32) -> Self {
        Self { high_threshold }
    }
}

#[async_trait]
impl Stage for MetadataFilteringStage {
    fn name(&self) -> &'static str {
        "metadata_filtering"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec!["category", "category_confidence"],
            guaranteed_outputs: vec!["filter_used", "fallback_triggered", "filtering_reason"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let mut partial = PartialRunState::default();

        let confidence = state.category_confidence.unwrap_or(0.0);
        let has_category = state.category.is_some();

        if has_category && confidence >= self.high_threshold {
            partial.filter_used = Some(true);
            partial.fallback_triggered = Some(false);
            partial.filtering_reason = Some(Some(format!(
                "category confidence {confidence:.2} met threshold {:.2}",
                self.high_threshold
            )));
        } else {
            partial.filter_used = Some(false);
            partial.fallback_triggered = Some(true);
            partial.filtering_reason = Some(Some(if has_category {
                format!(
                    "category confidence {confidence:.2} below threshold {:.2}, using unfiltered search",
                    self.high_threshold
                )
            } else {
                "no category classified, using unfiltered search".to_string()
            }));
        }

        Ok(partial)
    }
}
