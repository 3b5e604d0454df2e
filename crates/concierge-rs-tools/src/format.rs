//! Rendering of tool execution results as model-facing tool messages.

use crate::output_policy::ToolOutputPolicy;
use concierge_rs_protocol::{ChatMessage, ToolExecutionResult, ToolOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Content answering one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultMessage {
    pub tool_call_id: String,
    pub content: String,
}

impl ToolResultMessage {
    pub fn into_chat_message(self) -> ChatMessage {
        ChatMessage::tool(self.tool_call_id, self.content)
    }
}

/// Render each result in order. Successes become policy-filtered JSON;
/// failures become a sentence the model can recover from.
pub fn format_tool_results_for_ai(
    results: &[ToolExecutionResult],
    policy: &ToolOutputPolicy,
) -> Vec<ToolResultMessage> {
    results
        .iter()
        .map(|result| ToolResultMessage {
            tool_call_id: result.tool_call.id.clone(),
            content: render_outcome(result, policy),
        })
        .collect()
}

fn render_outcome(result: &ToolExecutionResult, policy: &ToolOutputPolicy) -> String {
    match &result.outcome {
        ToolOutcome::Success {
            results,
            source,
            products,
        } => {
            let mut payload = json!({
                "source": source,
                "result_count": results.len(),
                "results": results,
            });
            if !products.is_empty()
                && let Some(map) = payload.as_object_mut()
            {
                map.insert("products".to_string(), json!(products));
            }
            policy.render(payload)
        }
        ToolOutcome::Failure { kind, message } => format!(
            "Tool '{}' failed ({kind}): {}",
            result.tool_name,
            policy.apply_text(message)
        ),
    }
}
