//! `query_translation` stage: translate into the knowledge base's primary
//! language so both retrieval legs work within one language.

use crate::query_prep::Translator;
use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

/// Wraps a [`Translator`]; if no translation was necessary, `translated_query`
/// falls back to the original (aggregated, if present) query and
/// `translation_performed` is `false`.
pub struct QueryTranslationStage {
    translator: Arc<dyn Translator>,
    target_language: String,
}

impl QueryTranslationStage {
    /// Construct a new stage targeting `target_language`.
    pub fn new(translator: Arc<dyn Translator>, target_language: impl Into<String>) -> Self {
        Self {
            translator,
            target_language: target_language.into(),
        }
    }
}

#[async_trait]
impl Stage for QueryTranslationStage {
    fn name(&self) -> &'static str {
        "query_translation"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["question"],
            optional: vec!["detected_language", "language_confidence", "aggregated_query"],
            guaranteed_outputs: vec!["translated_query"],
            conditional_outputs: vec!["translation_performed"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let source_text = state.aggregated_query.as_deref().unwrap_or(&state.question);
        let source_language = state.detected_language.as_deref().unwrap_or(&self.target_language);

        let mut partial = PartialRunState::default();
        match self
            .translator
            .translate(source_text, source_language, &self.target_language)
            .await?
        {
            Some(translated) => {
                partial.translated_query = Some(Some(translated));
                partial.translation_performed = Some(true);
            }
            None => {
                partial.translated_query = Some(Some(source_text.to_string()));
                partial.translation_performed = Some(false);
            }
        }
        Ok(partial)
    }
}
