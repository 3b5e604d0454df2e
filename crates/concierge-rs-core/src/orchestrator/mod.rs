//! Bounded reason-act loop over a chat model and a tool executor.

mod postprocess;
mod products;

use crate::error::CoreError;
use crate::links::{AllowedHostsSanitizer, LinkSanitizer};
use crate::prompt::get_enhanced_prompt;
use concierge_rs_config::{ConciergeConfig, OrchestratorConfig};
use concierge_rs_memory::ConversationMemory;
use concierge_rs_protocol::{
    AssistantMessage, ChatChoice, ChatMessage, ChatModel, ChatRequest, LogLevel, Role,
    SearchLogEntry, Telemetry, ToolCall, ToolExecutionResult, ToolFailureKind, ToolOutcome,
    TurnResult,
};
use concierge_rs_tools::{
    ToolCatalog, ToolExecutor, ToolOutputPolicy, format_tool_results_for_ai,
};
use log::{debug, info, warn};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Reply used when the first completion carries neither text nor tool calls.
pub const NO_RESPONSE_FALLBACK: &str =
    "I'm sorry, I was unable to generate a response. Please try rephrasing your question.";

/// Reply used when the iteration bound runs out before the model produces usable text.
pub const EXHAUSTED_FALLBACK: &str = "I'm sorry, I'm having trouble finding complete information right now. \
Could you try rephrasing or narrowing down your question?";

const TELEMETRY_CHANNEL: &str = "ai";

/// Drives one turn: completion, concurrent tool rounds, then post-processed text.
pub struct ReasoningLoop {
    llm: Arc<dyn ChatModel>,
    catalog: Arc<dyn ToolCatalog>,
    executor: Arc<dyn ToolExecutor>,
    sanitizer: Arc<dyn LinkSanitizer>,
    config: OrchestratorConfig,
    output_policy: ToolOutputPolicy,
}

impl ReasoningLoop {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        catalog: Arc<dyn ToolCatalog>,
        executor: Arc<dyn ToolExecutor>,
        config: &ConciergeConfig,
    ) -> Self {
        Self {
            llm,
            catalog,
            executor,
            sanitizer: Arc::new(AllowedHostsSanitizer::new(&config.links.allowed_hosts)),
            config: config.orchestrator.clone(),
            output_policy: ToolOutputPolicy::from(&config.tools.output_policy),
        }
    }

    /// Replace the outbound link sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn LinkSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run the loop over `messages` for a storefront `domain`.
    ///
    /// Only model transport errors and malformed completions escape as errors.
    /// Tool failures are folded back into the conversation and the search log.
    pub async fn run(
        &self,
        mut messages: Vec<ChatMessage>,
        domain: &str,
        memory: Option<&ConversationMemory>,
        telemetry: Option<&dyn Telemetry>,
    ) -> Result<TurnResult, CoreError> {
        let max_rounds = self.config.effective_max_search_iterations();
        let tool_timeout = self.config.tool_timeout();

        let definitions = self.catalog.available_tools(domain).await;
        let availability = self.catalog.check_availability(domain).await;
        let instructions = self.catalog.tool_instructions(&availability);
        augment_system_message(&mut messages, &instructions, memory);
        let tools = (!definitions.is_empty()).then_some(definitions);

        emit(
            telemetry,
            LogLevel::Info,
            "Getting initial completion",
            json!({ "message_count": messages.len(), "iteration": 0 }),
        );
        info!(
            "starting reasoning loop (domain={}, messages={}, tools={}, max_rounds={})",
            domain,
            messages.len(),
            tools.as_ref().map_or(0, Vec::len),
            max_rounds
        );

        let mut turn = TurnResult::default();
        let mut executed: Vec<ToolExecutionResult> = Vec::new();
        let mut rounds: u32 = 0;

        let final_response = loop {
            let request = ChatRequest {
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let completion = self.llm.complete(request).await?;
            turn.iteration += 1;
            let message = first_message(completion.choices)?;
            let AssistantMessage {
                content,
                tool_calls,
            } = message;
            let content = content.unwrap_or_default();

            if tool_calls.is_empty() {
                notify_iteration(telemetry, turn.iteration, 0);
                if content.trim().is_empty() {
                    let fallback = if rounds == 0 {
                        NO_RESPONSE_FALLBACK
                    } else {
                        EXHAUSTED_FALLBACK
                    };
                    warn!(
                        "model returned no content (iteration={}, rounds={})",
                        turn.iteration, rounds
                    );
                    break fallback.to_string();
                }
                break self.post_process(&content, domain);
            }

            if rounds >= max_rounds {
                warn!(
                    "iteration bound reached with pending tool calls (iteration={}, max_rounds={}, pending={})",
                    turn.iteration,
                    max_rounds,
                    tool_calls.len()
                );
                notify_iteration(telemetry, turn.iteration, tool_calls.len());
                break EXHAUSTED_FALLBACK.to_string();
            }

            rounds += 1;
            debug!(
                "executing tool round (iteration={}, round={}, calls={})",
                turn.iteration,
                rounds,
                tool_calls.len()
            );
            let reported = self
                .executor
                .execute_parallel(&tool_calls, domain, tool_timeout, telemetry)
                .await;
            let results = align_with_calls(&tool_calls, reported);

            for result in &results {
                let entry = SearchLogEntry {
                    tool: result.tool_name.clone(),
                    query: result.query(),
                    result_count: result.outcome.result_count(),
                    source: result.outcome.source(),
                };
                if let Some(telemetry) = telemetry {
                    telemetry.track_search(&entry);
                }
                turn.search_log.push(entry);
                if let ToolOutcome::Success { results: hits, .. } = &result.outcome {
                    turn.all_search_results.extend(hits.iter().cloned());
                }
            }
            notify_iteration(telemetry, turn.iteration, tool_calls.len());

            messages.push(ChatMessage::assistant_tool_calls(content, tool_calls));
            messages.extend(
                format_tool_results_for_ai(&results, &self.output_policy)
                    .into_iter()
                    .map(|message| message.into_chat_message()),
            );
            executed.extend(results);
        };

        let products = products::collect_products(&executed);
        turn.shopping_context = products::shopping_context(&products);
        turn.shopping_products = (!products.is_empty()).then_some(products);
        turn.final_response = final_response;

        emit(
            telemetry,
            LogLevel::Info,
            "Turn complete",
            json!({
                "iteration": turn.iteration,
                "tool_calls": turn.search_log.len(),
                "result_count": turn.all_search_results.len(),
            }),
        );
        Ok(turn)
    }

    fn post_process(&self, text: &str, domain: &str) -> String {
        let sanitized = if self.config.is_local_domain(domain) {
            debug!("skipping link sanitization for local domain (domain={domain})");
            text.to_string()
        } else {
            self.sanitizer.sanitize(text)
        };
        let collapsed = postprocess::collapse_blank_lines(&sanitized);
        postprocess::bulletize_ordered_lists(&collapsed)
    }
}

/// Append tool instructions and the memory context block to the system message,
/// inserting one at the front when the history has none.
fn augment_system_message(
    messages: &mut Vec<ChatMessage>,
    instructions: &str,
    memory: Option<&ConversationMemory>,
) {
    let position = messages
        .iter()
        .position(|message| message.role == Role::System);
    let base = position
        .and_then(|index| messages.get(index))
        .map(|message| message.content.clone())
        .unwrap_or_default();
    let with_tools = if instructions.trim().is_empty() {
        base.clone()
    } else if base.is_empty() {
        instructions.to_string()
    } else {
        format!("{base}\n\n{instructions}")
    };
    let enhanced = get_enhanced_prompt(&with_tools, memory);

    match position.and_then(|index| messages.get_mut(index)) {
        Some(system) => system.content = enhanced,
        None if !enhanced.is_empty() => messages.insert(0, ChatMessage::system(enhanced)),
        None => {}
    }
}

fn first_message(choices: Vec<ChatChoice>) -> Result<AssistantMessage, CoreError> {
    let choice = choices
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::Protocol("completion contained no choices".to_string()))?;
    choice
        .message
        .ok_or_else(|| CoreError::Protocol("completion choice had no message".to_string()))
}

/// Order results by the issuing calls, synthesizing a failure for any call
/// the executor did not report.
fn align_with_calls(
    calls: &[ToolCall],
    reported: Vec<ToolExecutionResult>,
) -> Vec<ToolExecutionResult> {
    let mut by_id: HashMap<String, ToolExecutionResult> = HashMap::new();
    for result in reported {
        by_id.entry(result.tool_call.id.clone()).or_insert(result);
    }
    calls
        .iter()
        .map(|call| {
            by_id.remove(&call.id).unwrap_or_else(|| {
                warn!(
                    "executor reported no result for tool call (tool={}, call_id={})",
                    call.name, call.id
                );
                ToolExecutionResult::new(
                    call.clone(),
                    ToolOutcome::failure(
                        ToolFailureKind::Execution,
                        "no result reported by executor",
                    ),
                    0,
                )
            })
        })
        .collect()
}

fn notify_iteration(telemetry: Option<&dyn Telemetry>, iteration: u32, tool_call_count: usize) {
    if let Some(telemetry) = telemetry {
        telemetry.track_iteration(iteration, tool_call_count);
    }
}

fn emit(
    telemetry: Option<&dyn Telemetry>,
    level: LogLevel,
    message: &str,
    fields: serde_json::Value,
) {
    if let Some(telemetry) = telemetry {
        telemetry.log(level, TELEMETRY_CHANNEL, message, &fields);
    }
}
