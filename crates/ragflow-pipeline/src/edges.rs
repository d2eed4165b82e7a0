//! Canonical stage ordering, build-time invariant checks, and the
//! conditional branch predicates evaluated mid-request.
//!
//! Grounded in `original_source/app/pipeline/graph_builder.py` (ordering and
//! edge wiring) and `app/pipeline/routing_logic.py` /
//! `app/nodes/routing/logic.py` (branch predicates).

use crate::error::PipelineError;
use ragflow_core::{Action, CacheReason, DialogState, RunState};

/// The canonical stage ordering, leaves first. A compiled pipeline's enabled
/// stages must appear in this relative order; disabling a stage removes it
/// and short-circuits edges through it.
pub const CANONICAL_ORDER: &[&str] = &[
    "session_starter",
    "input_guardrails",
    "check_cache",
    "dialog_analysis",
    "aggregation",
    "language_detection",
    "query_translation",
    "easy_classification",
    "classification",
    "metadata_filtering",
    "query_expansion",
    "vector_search",
    "lexical_search",
    "fusion",
    "rerank",
    "state_machine",
    "routing",
    "prompt_routing",
    "generation",
    "output_guardrails",
    "archive_session",
    "store_in_cache",
];

/// Validate the five build-time hard invariants from spec.md §4.2 against a
/// set of enabled stage names (order as given). Returns the first violation.
pub fn validate_dag(enabled: &[&str]) -> Result<(), PipelineError> {
    let pos = |name: &str| enabled.iter().position(|s| *s == name);
    let has = |name: &str| enabled.contains(&name);

    if has("fusion") && !(has("vector_search") && has("lexical_search")) {
        return Err(PipelineError::InvalidDag(
            "fusion requires both vector_search and lexical_search to be enabled".into(),
        ));
    }

    if let (Some(fusion_pos), Some(vector_pos)) = (pos("fusion"), pos("vector_search")) {
        if vector_pos > fusion_pos {
            return Err(PipelineError::InvalidDag(
                "vector_search must precede fusion".into(),
            ));
        }
    }
    if let (Some(fusion_pos), Some(lexical_pos)) = (pos("fusion"), pos("lexical_search")) {
        if lexical_pos > fusion_pos {
            return Err(PipelineError::InvalidDag(
                "lexical_search must precede fusion".into(),
            ));
        }
    }

    if let (Some(rerank_pos), Some(sm_pos)) = (pos("rerank"), pos("state_machine")) {
        if rerank_pos > sm_pos {
            return Err(PipelineError::InvalidDag(
                "rerank must precede state_machine".into(),
            ));
        }
    }
    if let (Some(sm_pos), Some(routing_pos)) = (pos("state_machine"), pos("routing")) {
        if sm_pos > routing_pos {
            return Err(PipelineError::InvalidDag(
                "state_machine must precede routing".into(),
            ));
        }
    }
    if let (Some(routing_pos), Some(gen_pos)) = (pos("routing"), pos("generation")) {
        if routing_pos > gen_pos {
            return Err(PipelineError::InvalidDag(
                "routing must precede generation".into(),
            ));
        }
    }

    Ok(())
}

/// What the orchestrator should do immediately after a stage completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    /// Continue to the next stage in canonical order.
    Continue,
    /// Jump directly to the named stage, skipping everything in between.
    JumpTo(&'static str),
    /// Stop executing stages; the request is complete.
    End,
}

/// After `input_guardrails`: blocked turns jump straight to the state
/// machine (which will transition to `BLOCKED`), skipping retrieval entirely;
/// turns already in clarification mode branch to the clarification stage;
/// otherwise continue.
pub fn after_input_guardrails(state: &RunState) -> Branch {
    if state.guardrails_blocked() {
        Branch::JumpTo("state_machine")
    } else if state.dialog_state == DialogState::AwaitingClarification {
        Branch::JumpTo("clarification_questions")
    } else {
        Branch::Continue
    }
}

/// After `check_cache` (and optional semantic similarity check): a hit skips
/// straight to cache write-back/TTL refresh and ends the request.
pub fn after_check_cache(state: &RunState) -> Branch {
    if state.cache_hit {
        Branch::JumpTo("store_in_cache")
    } else {
        Branch::Continue
    }
}

/// After `dialog_analysis`: a safety violation or an explicit escalation
/// request fast-escalates straight to the state machine, skipping
/// retrieval.
pub fn after_dialog_analysis(state: &RunState) -> Branch {
    if state.safety_violation || state.escalation_requested {
        Branch::JumpTo("state_machine")
    } else {
        Branch::Continue
    }
}

/// After `routing`: auto-reply turns proceed to generation; anything else
/// (handoff, block) skips straight to archive/cache and ends.
pub fn after_routing(state: &RunState) -> Branch {
    match state.action {
        Some(Action::AutoReply) => Branch::Continue,
        _ => Branch::JumpTo("archive_session"),
    }
}

/// After retrieval/rerank: a document demanding clarification, or a dialog
/// state already at `AwaitingClarification`, branches to the clarification
/// stage instead of generation.
pub fn after_retrieval(state: &RunState) -> Branch {
    let needs_clarification = state
        .best_doc_metadata
        .as_ref()
        .map(|meta| !meta.clarifying_questions.is_empty())
        .unwrap_or(false)
        || state.dialog_state == DialogState::AwaitingClarification;

    if needs_clarification {
        Branch::JumpTo("clarification_questions")
    } else {
        Branch::Continue
    }
}

/// Human-readable reason a cache hit occurred, for logging/observability —
/// not itself a branch predicate, but used right after `after_check_cache`.
pub fn cache_hit_reason(state: &RunState) -> Option<CacheReason> {
    state.cache_reason
}
