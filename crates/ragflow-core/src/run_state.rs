//! The per-request run-state container.
//!
//! `RunState` is a fixed, typed struct rather than an untyped map: every field
//! is named, typed, and carries a single, compile-time-known reducer. Stages
//! never see the whole struct — they declare a [`crate::contract::StageContract`]
//! and the orchestrator projects the state down to just the fields they
//! asked for (see `ragflow-pipeline`). Stages return a [`PartialRunState`],
//! which [`RunState::apply`] merges back in according to each field's
//! reducer.
//!
//! Grounded in `original_source/app/pipeline/state.py`'s `State` TypedDict and
//! its `overwrite` / `keep_latest` / `merge_unique` reducer functions.

use crate::dialog::{ActionRecommendation, DialogState};
use crate::document::{DocumentMetadata, ScoredDocument};
use crate::reducers;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The speaker role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A message sent by the end user.
    User,
    /// A message sent by the assistant.
    Assistant,
    /// A system-level instruction or context message.
    System,
}

/// One turn of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identifier, used for de-dup on append. `None` for messages
    /// constructed ad hoc (e.g. in tests) rather than loaded from storage.
    pub id: Option<String>,
    /// Who sent the message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// When the message was recorded, if known.
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    /// Free-form metadata attached to the message.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Five boolean signals plus a sentiment record produced by dialog analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogAnalysis {
    /// The user expressed thanks / satisfaction.
    pub is_gratitude: bool,
    /// The user explicitly asked for a human operator.
    pub escalation_requested: bool,
    /// The turn is phrased as a question.
    pub is_question: bool,
    /// Frustration markers were detected in the turn.
    pub frustration_detected: bool,
    /// The current question repeats a recent one without resolution.
    pub repeated_question: bool,
    /// Derived in the state machine (not set by dialog analysis itself):
    /// whether `confidence < threshold`.
    #[serde(default)]
    pub confidence_below_threshold: bool,
    /// Derived in the state machine: whether any candidate document demands
    /// a human handoff.
    #[serde(default)]
    pub requires_handoff: bool,
}

/// Sentiment classification for the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Coarse sentiment label.
    pub label: SentimentLabel,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}

/// Coarse sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    /// Positive sentiment.
    Positive,
    /// Neutral sentiment.
    Neutral,
    /// Negative sentiment.
    Negative,
}

/// The routing stage's terminal decision for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Generate and return an answer automatically.
    AutoReply,
    /// Hand the conversation off to a human operator.
    Handoff,
    /// A guardrail blocked this turn outright.
    Block,
}

/// Why a cache lookup hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheReason {
    /// The exact normalized question + scope matched a cache key.
    ExactMatch,
    /// The question's embedding was within the similarity threshold of a
    /// stored key's embedding.
    SemanticMatch,
}

/// Why escalation was decided, in fallback-resolution order (spec.md §4.6):
/// `safety_violation → user_requested → low_confidence → state_machine_decision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// An output or input guardrail detected a safety violation.
    SafetyViolation,
    /// The user explicitly asked for a human.
    UserRequested,
    /// Retrieval confidence fell below threshold.
    LowConfidence,
    /// No more specific reason applied; the state machine's rules decided.
    StateMachineDecision,
    /// A guardrail blocked the turn (distinct from a safety violation found
    /// by the dialog analyzer).
    GuardrailsBlock,
}

impl EscalationReason {
    /// The wire/debug string used in `RunState::escalation_reason`.
    pub fn as_str(self) -> &'static str {
        match self {
            EscalationReason::SafetyViolation => "safety_violation",
            EscalationReason::UserRequested => "user_requested",
            EscalationReason::LowConfidence => "low_confidence",
            EscalationReason::StateMachineDecision => "state_machine_decision",
            EscalationReason::GuardrailsBlock => "guardrails_block",
        }
    }
}

/// Aggregate guardrail outcome for one side (input or output) of a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailOutcome {
    /// At least one scanner's checks passed cleanly.
    pub passed: bool,
    /// The pipeline must stop; substitute a safe rejection message.
    pub blocked: bool,
    /// A scanner triggered but the mode was `log`, not `block`.
    pub warning: bool,
    /// A scanner's span was sanitized (mode `sanitize`).
    pub sanitized: bool,
    /// Names of every scanner that triggered, regardless of mode.
    pub triggered: Vec<String>,
    /// Max risk score across all scanners in `[0, 1]`.
    pub risk_score: f32,
}

/// The per-request, reducer-aware bag of fields threaded through every
/// pipeline stage. See module docs for the projection/merge model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    // --- Request ---
    /// The user's raw question text for this turn.
    pub question: String,
    /// Resolved user identity, if known.
    pub user_id: Option<String>,
    /// Session identifier this turn belongs to.
    pub session_id: Option<String>,
    /// Full conversation history, oldest first. Reducer: append-messages.
    pub conversation_history: Vec<Message>,
    /// Language detected for the current turn (ISO 639-1 code).
    pub detected_language: Option<String>,
    /// Confidence in the detected language, `[0, 1]`.
    pub language_confidence: Option<f32>,

    // --- Derived query ---
    /// Query aggregated from the current turn plus relevant history context.
    pub aggregated_query: Option<String>,
    /// Query translated into the knowledge base's primary language.
    pub translated_query: Option<String>,
    /// Whether a translation was actually performed (vs. a no-op passthrough
    /// because the language already matched).
    pub translation_performed: bool,
    /// Entities extracted from the query, grouped by kind.
    pub extracted_entities: HashMap<String, Vec<String>>,
    /// Paraphrased query expansions used for parallel sub-searches.
    pub queries: Vec<String>,

    // --- Retrieval ---
    /// Raw vector search hits, ranked.
    pub vector_results: Vec<ScoredDocument>,
    /// Raw lexical search hits, ranked.
    pub lexical_results: Vec<ScoredDocument>,
    /// Finalized, ordered candidate list after fusion/rerank. Reducer:
    /// keep-latest (an absent update must not erase a prior stage's result).
    pub docs: Vec<ScoredDocument>,
    /// Rerank scores aligned index-for-index with `docs`.
    pub rerank_scores: Vec<f32>,
    /// Top rerank score, or 0 if `docs` is empty.
    pub confidence: f32,
    /// Metadata of the top-ranked document, if any.
    pub best_doc_metadata: Option<DocumentMetadata>,
    /// Whether both vector and lexical legs contributed to fusion.
    pub hybrid_used: bool,

    // --- Classification ---
    /// Top-matched taxonomy category.
    pub category: Option<String>,
    /// Top-matched taxonomy intent.
    pub intent: Option<String>,
    /// Confidence of the category match, `[0, 1]`.
    pub category_confidence: Option<f32>,
    /// Confidence of the intent match, `[0, 1]`.
    pub intent_confidence: Option<f32>,
    /// Whether metadata filtering restricted retrieval to `category`.
    pub filter_used: bool,
    /// Whether filtering fell back to unfiltered search.
    pub fallback_triggered: bool,
    /// Human-readable reason filtering did or didn't apply.
    pub filtering_reason: Option<String>,
    /// Deprecated alias retained for downstream compatibility; mirrors
    /// `category` once classification has run.
    pub matched_category: Option<String>,
    /// Deprecated alias retained for downstream compatibility; mirrors
    /// `intent` once classification has run.
    pub matched_intent: Option<String>,

    // --- Dialog ---
    /// Signals derived from the latest turn.
    pub dialog_analysis: Option<DialogAnalysis>,
    /// Current node in the dialog state machine.
    pub dialog_state: DialogState,
    /// Number of unresolved attempts in the current dialog_state "loop".
    pub attempt_count: u32,
    /// Sentiment of the latest turn.
    pub sentiment: Option<Sentiment>,
    /// A guardrail or dialog-analysis signal indicated a safety violation.
    pub safety_violation: bool,
    /// The user explicitly asked to be escalated (mirrors
    /// `dialog_analysis.escalation_requested` for convenience).
    pub escalation_requested: bool,
    /// Pre-decision from routing: whether this turn should escalate before
    /// the state machine runs (`"escalate"` / `"auto_reply"`).
    pub escalation_decision: Option<String>,
    /// Why escalation was decided, if `action == Handoff`.
    pub escalation_reason: Option<String>,
    /// The state machine's recommended action for this turn.
    pub action_recommendation: Option<ActionRecommendation>,
    /// Debug trail: which rule or override produced the last transition.
    pub transition_source: Option<String>,
    /// Set when routing's always-escalate policy overrode confidence-based
    /// routing.
    pub escalation_triggered: bool,
    /// User-facing text substituted when action is `Handoff` or `Block`.
    pub escalation_message: Option<String>,

    // --- Generation ---
    /// System prompt constructed for this turn.
    pub system_prompt: Option<String>,
    /// Generated answer text.
    pub answer: Option<String>,
    /// Terminal action for this turn.
    pub action: Option<Action>,

    // --- Cache ---
    /// Whether this turn was served from cache.
    pub cache_hit: bool,
    /// Fingerprint key used for cache lookup/write-back.
    pub cache_key: Option<String>,
    /// Why the cache hit, if it did.
    pub cache_reason: Option<CacheReason>,
    /// Embedding of `question`, computed once and reused by cache and
    /// retrieval.
    pub question_embedding: Option<Vec<f32>>,

    // --- Guardrails ---
    /// Input-side guardrail outcome.
    pub input_guardrails: GuardrailOutcome,
    /// Output-side guardrail outcome.
    pub output_guardrails: GuardrailOutcome,
}

impl RunState {
    /// Construct a fresh run-state for a new request.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            dialog_state: DialogState::Initial,
            ..Default::default()
        }
    }

    /// True once either side's guardrails blocked the turn.
    pub fn guardrails_blocked(&self) -> bool {
        self.input_guardrails.blocked || self.output_guardrails.blocked
    }

    /// Merge a stage's partial update into this state, applying each
    /// touched field's declared reducer.
    pub fn apply(&mut self, partial: PartialRunState) {
        macro_rules! overwrite_field {
            ($field:ident) => {
                if let Some(v) = partial.$field {
                    self.$field = reducers::overwrite(std::mem::take(&mut self.$field), v);
                }
            };
        }

        overwrite_field!(question);
        overwrite_field!(user_id);
        overwrite_field!(session_id);
        if let Some(new_messages) = partial.conversation_history {
            self.conversation_history = reducers::append_messages(
                std::mem::take(&mut self.conversation_history),
                new_messages,
            );
        }
        overwrite_field!(detected_language);
        overwrite_field!(language_confidence);

        overwrite_field!(aggregated_query);
        overwrite_field!(translated_query);
        overwrite_field!(translation_performed);
        overwrite_field!(extracted_entities);
        if let Some(new_queries) = partial.queries {
            self.queries = reducers::merge_unique(std::mem::take(&mut self.queries), new_queries);
        }

        overwrite_field!(vector_results);
        overwrite_field!(lexical_results);
        if partial.docs.is_some() {
            self.docs = reducers::keep_latest(
                Some(std::mem::take(&mut self.docs)),
                partial.docs,
            )
            .unwrap_or_default();
        }
        overwrite_field!(rerank_scores);
        overwrite_field!(confidence);
        overwrite_field!(best_doc_metadata);
        overwrite_field!(hybrid_used);

        overwrite_field!(category);
        overwrite_field!(intent);
        overwrite_field!(category_confidence);
        overwrite_field!(intent_confidence);
        overwrite_field!(filter_used);
        overwrite_field!(fallback_triggered);
        overwrite_field!(filtering_reason);
        overwrite_field!(matched_category);
        overwrite_field!(matched_intent);

        overwrite_field!(dialog_analysis);
        overwrite_field!(dialog_state);
        overwrite_field!(attempt_count);
        overwrite_field!(sentiment);
        overwrite_field!(safety_violation);
        overwrite_field!(escalation_requested);
        overwrite_field!(escalation_decision);
        overwrite_field!(escalation_reason);
        overwrite_field!(action_recommendation);
        overwrite_field!(transition_source);
        overwrite_field!(escalation_triggered);
        overwrite_field!(escalation_message);

        overwrite_field!(system_prompt);
        overwrite_field!(answer);
        overwrite_field!(action);

        overwrite_field!(cache_hit);
        overwrite_field!(cache_key);
        overwrite_field!(cache_reason);
        overwrite_field!(question_embedding);

        overwrite_field!(input_guardrails);
        overwrite_field!(output_guardrails);
    }
}

/// A stage's partial output: every field a stage might produce, all
/// optional. Only the fields a stage actually returns are `Some`.
#[derive(Debug, Clone, Default)]
pub struct PartialRunState {
    pub question: Option<String>,
    pub user_id: Option<Option<String>>,
    pub session_id: Option<Option<String>>,
    pub conversation_history: Option<Vec<Message>>,
    pub detected_language: Option<Option<String>>,
    pub language_confidence: Option<Option<f32>>,

    pub aggregated_query: Option<Option<String>>,
    pub translated_query: Option<Option<String>>,
    pub translation_performed: Option<bool>,
    pub extracted_entities: Option<HashMap<String, Vec<String>>>,
    pub queries: Option<Vec<String>>,

    pub vector_results: Option<Vec<ScoredDocument>>,
    pub lexical_results: Option<Vec<ScoredDocument>>,
    pub docs: Option<Vec<ScoredDocument>>,
    pub rerank_scores: Option<Vec<f32>>,
    pub confidence: Option<f32>,
    pub best_doc_metadata: Option<Option<DocumentMetadata>>,
    pub hybrid_used: Option<bool>,

    pub category: Option<Option<String>>,
    pub intent: Option<Option<String>>,
    pub category_confidence: Option<Option<f32>>,
    pub intent_confidence: Option<Option<f32>>,
    pub filter_used: Option<bool>,
    pub fallback_triggered: Option<bool>,
    pub filtering_reason: Option<Option<String>>,
    pub matched_category: Option<Option<String>>,
    pub matched_intent: Option<Option<String>>,

    pub dialog_analysis: Option<Option<DialogAnalysis>>,
    pub dialog_state: Option<DialogState>,
    pub attempt_count: Option<u32>,
    pub sentiment: Option<Option<Sentiment>>,
    pub safety_violation: Option<bool>,
    pub escalation_requested: Option<bool>,
    pub escalation_decision: Option<Option<String>>,
    pub escalation_reason: Option<Option<String>>,
    pub action_recommendation: Option<Option<ActionRecommendation>>,
    pub transition_source: Option<Option<String>>,
    pub escalation_triggered: Option<bool>,
    pub escalation_message: Option<Option<String>>,

    pub system_prompt: Option<Option<String>>,
    pub answer: Option<Option<String>>,
    pub action: Option<Option<Action>>,

    pub cache_hit: Option<bool>,
    pub cache_key: Option<Option<String>>,
    pub cache_reason: Option<Option<CacheReason>>,
    pub question_embedding: Option<Option<Vec<f32>>>,

    pub input_guardrails: Option<GuardrailOutcome>,
    pub output_guardrails: Option<GuardrailOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_overwrites_scalar_fields() {
        let mut state = RunState::new("hello");
        let mut partial = PartialRunState::default();
        partial.confidence = Some(0.8);
        state.apply(partial);
        assert_eq!(state.confidence, 0.8);
    }

    #[test]
    fn apply_keeps_docs_when_partial_absent() {
        let mut state = RunState::new("hello");
        state.docs = vec![];
        let doc = ScoredDocument {
            document: crate::document::Document::new("content", vec![0.1], Default::default()),
            score: 0.9,
            rank: 1,
        };
        let mut partial = PartialRunState::default();
        partial.docs = Some(vec![doc.clone()]);
        state.apply(partial);
        assert_eq!(state.docs.len(), 1);

        // Applying an update that doesn't touch docs must not erase it.
        state.apply(PartialRunState::default());
        assert_eq!(state.docs.len(), 1);
    }

    #[test]
    fn apply_appends_and_dedupes_conversation_history() {
        let mut state = RunState::new("hello");
        let mut p1 = PartialRunState::default();
        p1.conversation_history = Some(vec![Message {
            id: Some("1".into()),
            role: Role::User,
            content: "hi".into(),
            timestamp: None,
            metadata: Default::default(),
        }]);
        state.apply(p1);

        let mut p2 = PartialRunState::default();
        p2.conversation_history = Some(vec![
            Message {
                id: Some("1".into()),
                role: Role::User,
                content: "hi".into(),
                timestamp: None,
                metadata: Default::default(),
            },
            Message {
                id: Some("2".into()),
                role: Role::Assistant,
                content: "hello!".into(),
                timestamp: None,
                metadata: Default::default(),
            },
        ]);
        state.apply(p2);

        assert_eq!(state.conversation_history.len(), 2);
    }

    #[test]
    fn guardrails_blocked_checks_both_sides() {
        let mut state = RunState::new("hello");
        assert!(!state.guardrails_blocked());
        state.input_guardrails.blocked = true;
        assert!(state.guardrails_blocked());
    }
}
