//! Dialog analysis, the declarative rules engine, the dialog state machine,
//! and routing.

pub mod analysis;
pub mod error;
pub mod prompt_routing;
pub mod routing;
pub mod rules_engine;
pub mod stages;
pub mod state_machine;

pub use analysis::{DialogAnalyzer, DialogLlmClient, LlmDialogAnalyzer, RegexDialogAnalyzer};
pub use error::{DialogError, Result};
pub use prompt_routing::{StaticInstructions, SystemInstructions};
pub use routing::{BlacklistPolicy, RoutingDecision};
pub use rules_engine::{
    Condition, Defaults, DynamicCondition, DynamicConditionKind, DynamicRule, Operator,
    PostCondition, Rule, RuleAction, RulesEngine, RulesEngineConfig, TransitionResult,
};
pub use stages::*;
pub use state_machine::{StateMachine, StateMachineOutcome};
