//! Compiles a stage list into an executable pipeline and runs it per
//! request.
//!
//! Grounded in `original_source/app/pipeline/graph_builder.py` (compile-time
//! wiring) and `app/pipeline/routing_logic.py` (branch dispatch during
//! execution). Stages within one request execute sequentially by default;
//! the retrieval fan-out (`vector_search`, `lexical_search`, optional
//! `query_expansion`) runs concurrently and joins before `fusion`, per
//! spec.md §4.2's execution model.

use crate::edges::{self, Branch, CANONICAL_ORDER};
use crate::error::PipelineError;
use crate::registry::StageRegistry;
use crate::stage::Stage;
use ragflow_core::{PipelineConfig, RunState};
use tracing::{info_span, Instrument};

/// Stage names that may run concurrently with one another before joining at
/// `fusion`.
const FAN_OUT_STAGES: &[&str] = &["vector_search", "lexical_search", "query_expansion"];

/// A compiled, ready-to-run pipeline: a fixed sequence of stage instances in
/// validated canonical order.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Pipeline {
    /// Compile `config.enabled_stages` (or the full canonical order, if
    /// empty) against `registry`, failing on an unregistered stage name or a
    /// violated ordering invariant.
    pub fn compile(registry: &StageRegistry, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let enabled: Vec<&str> = if config.enabled_stages.is_empty() {
            CANONICAL_ORDER.to_vec()
        } else {
            config.enabled_stages.iter().map(String::as_str).collect()
        };

        for name in &enabled {
            if !registry.contains(name) {
                return Err(PipelineError::UnknownStage((*name).to_string()));
            }
        }

        edges::validate_dag(&enabled)?;

        let stages = enabled
            .iter()
            .map(|name| {
                registry
                    .build(name)
                    .expect("presence checked by the loop above")
            })
            .collect();

        Ok(Self { stages })
    }

    /// The names of the compiled stages, in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name() == name)
    }

    /// Run one request to completion, threading `initial` through the
    /// compiled stage sequence and honoring conditional branches.
    pub async fn run(&self, initial: RunState, trace_id: &str) -> Result<RunState, PipelineError> {
        let mut state = initial;
        let mut cursor = 0usize;

        while cursor < self.stages.len() {
            let name = self.stages[cursor].name();

            if FAN_OUT_STAGES.contains(&name) {
                cursor = self.run_fan_out(&mut state, cursor, trace_id).await?;
                continue;
            }

            let stage = &self.stages[cursor];
            let span = info_span!("stage", stage = name, trace_id);
            let partial = stage
                .execute(&state)
                .instrument(span)
                .await
                .map_err(|source| PipelineError::StageFailed {
                    stage: name.to_string(),
                    source,
                })?;
            state.apply(partial);

            match self.branch_after(name, &state) {
                Branch::Continue => cursor += 1,
                Branch::JumpTo(target) => match self.index_of(target) {
                    Some(idx) => cursor = idx,
                    None => break,
                },
                Branch::End => break,
            }
        }

        Ok(state)
    }

    /// Execute every contiguous fan-out stage starting at `start` concurrently,
    /// merging their partial updates in stage order (ties broken by the
    /// fixed order in `FAN_OUT_STAGES`) before continuing. Returns the index
    /// immediately after the fan-out group.
    async fn run_fan_out(
        &self,
        state: &mut RunState,
        start: usize,
        trace_id: &str,
    ) -> Result<usize, PipelineError> {
        let mut end = start;
        while end < self.stages.len() && FAN_OUT_STAGES.contains(&self.stages[end].name()) {
            end += 1;
        }

        let snapshot = &*state;
        let futures = self.stages[start..end].iter().map(|stage| {
            let name = stage.name();
            let span = info_span!("stage", stage = name, trace_id);
            async move {
                stage
                    .execute(snapshot)
                    .await
                    .map(|partial| (name, partial))
                    .map_err(|source| PipelineError::StageFailed {
                        stage: name.to_string(),
                        source,
                    })
            }
            .instrument(span)
        });

        let results = futures::future::join_all(futures).await;
        for result in results {
            let (_, partial) = result?;
            state.apply(partial);
        }

        Ok(end)
    }

    fn branch_after(&self, stage_name: &str, state: &RunState) -> Branch {
        match stage_name {
            "input_guardrails" => edges::after_input_guardrails(state),
            "check_cache" => edges::after_check_cache(state),
            "dialog_analysis" => edges::after_dialog_analysis(state),
            "rerank" => edges::after_retrieval(state),
            "routing" => edges::after_routing(state),
            "store_in_cache" => Branch::End,
            _ => Branch::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_stage;
    use async_trait::async_trait;
    use ragflow_core::{CoreError, PartialRunState, StageContract};

    struct EchoStage(&'static str);

    #[async_trait]
    impl Stage for EchoStage {
        fn name(&self) -> &'static str {
            self.0
        }
        fn contract(&self) -> StageContract {
            StageContract::default()
        }
        async fn execute(&self, _state: &RunState) -> Result<PartialRunState, CoreError> {
            Ok(PartialRunState::default())
        }
    }

    struct CacheHitStage;

    #[async_trait]
    impl Stage for CacheHitStage {
        fn name(&self) -> &'static str {
            "check_cache"
        }
        fn contract(&self) -> StageContract {
            StageContract::default()
        }
        async fn execute(&self, _state: &RunState) -> Result<PartialRunState, CoreError> {
            let mut partial = PartialRunState::default();
            partial.cache_hit = Some(true);
            Ok(partial)
        }
    }

    fn registry_with(names: &[&'static str]) -> StageRegistry {
        let mut registry = StageRegistry::new();
        for name in names {
            if *name == "check_cache" {
                register_stage!(registry, *name, || Box::new(CacheHitStage));
            } else {
                let n = *name;
                let factory: crate::registry::StageFactory = match n {
                    "vector_search" => || Box::new(EchoStage("vector_search")),
                    "lexical_search" => || Box::new(EchoStage("lexical_search")),
                    "fusion" => || Box::new(EchoStage("fusion")),
                    "store_in_cache" => || Box::new(EchoStage("store_in_cache")),
                    other => panic!("unmapped test stage {other}"),
                };
                registry.register(n, factory);
            }
        }
        registry
    }

    #[tokio::test]
    async fn compile_rejects_unregistered_stage() {
        let registry = StageRegistry::new();
        let mut config = PipelineConfig::default();
        config.enabled_stages = vec!["vector_search".to_string()];
        let err = Pipeline::compile(&registry, &config).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownStage(_)));
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_to_store_in_cache() {
        let registry = registry_with(&["check_cache", "vector_search", "lexical_search", "fusion", "store_in_cache"]);
        let mut config = PipelineConfig::default();
        config.enabled_stages = vec![
            "check_cache".to_string(),
            "vector_search".to_string(),
            "lexical_search".to_string(),
            "fusion".to_string(),
            "store_in_cache".to_string(),
        ];
        let pipeline = Pipeline::compile(&registry, &config).unwrap();
        let result = pipeline.run(RunState::new("hi"), "trace-1").await.unwrap();
        assert!(result.cache_hit);
    }

    #[tokio::test]
    async fn fan_out_stages_all_execute_before_fusion() {
        let registry = registry_with(&["vector_search", "lexical_search", "fusion"]);
        let mut config = PipelineConfig::default();
        config.enabled_stages = vec![
            "vector_search".to_string(),
            "lexical_search".to_string(),
            "fusion".to_string(),
        ];
        let pipeline = Pipeline::compile(&registry, &config).unwrap();
        assert_eq!(pipeline.stage_names(), vec!["vector_search", "lexical_search", "fusion"]);
        let result = pipeline.run(RunState::new("hi"), "trace-1").await;
        assert!(result.is_ok());
    }
}
