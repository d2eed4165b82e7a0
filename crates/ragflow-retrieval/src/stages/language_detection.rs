//! `language_detection` stage.

use crate::query_prep::LanguageDetector;
use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;
use tracing::warn;

/// Detects the question's language, falling back to a configured default
/// with zero confidence if the question is empty or detection fails
/// (`original_source/app/nodes/language_detection/node.py`).
pub struct LanguageDetectionStage {
    detector: Arc<dyn LanguageDetector>,
    fallback_language: String,
}

impl LanguageDetectionStage {
    /// Construct a new stage over the given detector.
    pub fn new(detector: Arc<dyn LanguageDetector>, fallback_language: impl Into<String>) -> Self {
        Self {
            detector,
            fallback_language: fallback_language.into(),
        }
    }
}

#[async_trait]
impl Stage for LanguageDetectionStage {
    fn name(&self) -> &'static str {
        "language_detection"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["question"],
            optional: vec![],
            guaranteed_outputs: vec!["detected_language", "language_confidence"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let mut partial = PartialRunState::default();

        if state.question.trim().is_empty() {
            partial.detected_language = Some(Some(self.fallback_language.clone()));
            partial.language_confidence = Some(Some(0.0));
            return Ok(partial);
        }

        match self.detector.detect(&state.question).await {
            Ok((language, confidence)) => {
                partial.detected_language = Some(Some(language));
                partial.language_confidence = Some(Some(confidence));
            }
            Err(err) => {
                warn!(error = %err, "language_detection: detector failed, using fallback language");
                partial.detected_language = Some(Some(self.fallback_language.clone()));
                partial.language_confidence = Some(Some(0.0));
            }
        }

        Ok(partial)
    }
}
