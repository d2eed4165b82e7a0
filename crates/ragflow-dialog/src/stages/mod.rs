//! Stage implementations for dialog analysis, the state machine, routing,
//! and clarification.

pub mod clarification_questions;
pub mod dialog_analysis;
pub mod prompt_routing_stage;
pub mod routing_stage;
pub mod state_machine_stage;

pub use clarification_questions::ClarificationQuestionsStage;
pub use dialog_analysis::DialogAnalysisStage;
pub use prompt_routing_stage::PromptRoutingStage;
pub use routing_stage::RoutingStage;
pub use state_machine_stage::StateMachineStage;
