//! The stage trait every pipeline node implements.

use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};

/// A single unit of pipeline work: a function `(RunState) -> PartialUpdate`
/// that additionally declares its contract (spec.md §4.1).
///
/// Implementations live in the domain crates (`ragflow-retrieval`,
/// `ragflow-dialog`, `ragflow-guardrails`, `ragflow-session`) — this crate
/// only knows the trait, the registry, and how to sequence stages.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The name this stage is registered under, matching its name in
    /// pipeline configuration.
    fn name(&self) -> &'static str;

    /// This stage's input/output contract.
    fn contract(&self) -> StageContract;

    /// Execute against a read-only view of the current run state, returning
    /// the fields this stage produced. Implementations must not mutate
    /// `state` directly — all writes happen through the returned partial
    /// update so reducer semantics stay centralized in
    /// [`ragflow_core::RunState::apply`].
    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError>;
}
