//! Builds the per-turn system prompt from `dialog_state`, grounded in
//! `original_source/app/nodes/prompt_routing/node.py`: a base instruction
//! selected by dialog state, with conversation history, extracted
//! entities, and (when available) a user profile appended as labeled
//! sections.

use ragflow_core::{DialogState, Message, Role};
use std::collections::HashMap;

/// Base system instruction selected by dialog state. A real deployment
/// loads these from files or a prompt-management service; the selection
/// logic itself — which instruction a given state maps to — is what this
/// module owns.
pub trait SystemInstructions: Send + Sync {
    /// The base instruction text for `state`, falling back to a default
    /// when the state has no dedicated instruction.
    fn instruction_for(&self, state: DialogState) -> &str;
}

/// An instruction set held entirely in memory, keyed by dialog state.
#[derive(Debug, Clone)]
pub struct StaticInstructions {
    by_state: HashMap<DialogState, String>,
    default: String,
}

impl StaticInstructions {
    pub fn new(default: impl Into<String>) -> Self {
        Self { by_state: HashMap::new(), default: default.into() }
    }

    pub fn with(mut self, state: DialogState, instruction: impl Into<String>) -> Self {
        self.by_state.insert(state, instruction.into());
        self
    }
}

impl SystemInstructions for StaticInstructions {
    fn instruction_for(&self, state: DialogState) -> &str {
        self.by_state.get(&state).map(String::as_str).unwrap_or(&self.default)
    }
}

/// At most this many of the most recent messages are rendered into the
/// history section.
const HISTORY_WINDOW: usize = 3;

fn format_history(history: &[Message]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => "USER",
                Role::Assistant => "ASSISTANT",
                Role::System => "SYSTEM",
            };
            format!("{role}: {}", message.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_entities(entities: &HashMap<String, Vec<String>>) -> String {
    let mut keys: Vec<&String> = entities.keys().collect();
    keys.sort();
    keys.into_iter().map(|key| format!("- {key}: {}", entities[key].join(", "))).collect::<Vec<_>>().join("\n")
}

fn format_profile(profile: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = profile.keys().collect();
    keys.sort();
    keys.into_iter().map(|key| format!("{key}: {}", profile[key])).collect::<Vec<_>>().join("\n")
}

/// Assemble the full system prompt: base instruction, then profile,
/// entities, and history sections — each omitted entirely when empty.
pub fn build_system_prompt(
    instructions: &dyn SystemInstructions,
    dialog_state: DialogState,
    conversation_history: &[Message],
    extracted_entities: &HashMap<String, Vec<String>>,
    user_profile: &HashMap<String, String>,
) -> String {
    let mut prompt = format!("{}\n\n", instructions.instruction_for(dialog_state));

    let profile_section = format_profile(user_profile);
    if !profile_section.is_empty() {
        prompt.push_str(&format!("--- User information ---\n{profile_section}\n\n"));
    }

    let entities_section = format_entities(extracted_entities);
    if !entities_section.is_empty() {
        prompt.push_str(&format!("--- Extracted data ---\n{entities_section}\n\n"));
    }

    let history_section = format_history(conversation_history);
    if !history_section.is_empty() {
        prompt.push_str(&format!("--- Conversation history ---\n{history_section}\n\n"));
    }

    prompt
}
