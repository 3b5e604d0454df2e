//! Per-conversation state and the turn driver tying the loop to memory.

use crate::error::CoreError;
use crate::orchestrator::ReasoningLoop;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;
use concierge_rs_config::ConciergeConfig;
use concierge_rs_memory::{
    ConversationMemory, HeuristicExtractor, ResponseExtractor, parse_and_track_entities,
};
use concierge_rs_protocol::{ChatMessage, Role, Telemetry, TurnResult};
use log::debug;

/// One conversation: its memory store, extractor, and base system prompt.
pub struct Conversation {
    memory: ConversationMemory,
    extractor: Box<dyn ResponseExtractor>,
    system_prompt: String,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            memory: ConversationMemory::new(),
            extractor: Box::new(HeuristicExtractor::new()),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Conversation with memory decay, default aliases, and prompt taken from config.
    pub fn from_config(config: &ConciergeConfig) -> Self {
        let memory = ConversationMemory::new().with_decay_turns(config.memory.entity_decay_turns);
        let extractor =
            HeuristicExtractor::new().with_default_aliases(config.memory.default_aliases.clone());
        let system_prompt = config
            .orchestrator
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        Self {
            memory,
            extractor: Box::new(extractor),
            system_prompt,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ResponseExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one user turn and record what the reply mentioned.
    ///
    /// `history` holds prior messages without the new user message. Memory is
    /// advanced only when the loop succeeds.
    pub async fn handle_turn(
        &mut self,
        reasoning: &ReasoningLoop,
        mut history: Vec<ChatMessage>,
        user_message: &str,
        domain: &str,
        telemetry: Option<&dyn Telemetry>,
    ) -> Result<TurnResult, CoreError> {
        if !history.iter().any(|message| message.role == Role::System) {
            history.insert(0, ChatMessage::system(self.system_prompt.clone()));
        }
        history.push(ChatMessage::user(user_message));

        let result = reasoning
            .run(history, domain, Some(&self.memory), telemetry)
            .await?;

        let turn = self.memory.increment_turn();
        let parsed = parse_and_track_entities(
            self.extractor.as_ref(),
            &result.final_response,
            user_message,
            &mut self.memory,
        );
        debug!(
            "conversation turn recorded (turn={}, entities={}, lists={}, corrections={})",
            turn,
            parsed.entities.len(),
            parsed.lists.len(),
            parsed.corrections.len()
        );
        Ok(result)
    }
}
