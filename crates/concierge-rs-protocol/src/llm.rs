//! Request/response boundary to the chat-completion model.

use crate::{ChatMessage, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors surfaced by the model transport. These propagate to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Provider rejected the request because of rate limiting.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    /// Credentials were missing or rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Network or HTTP failure talking to the provider.
    #[error("transport error: {0}")]
    Transport(String),
    /// Provider returned a payload that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Full message list, system message first.
    pub messages: Vec<ChatMessage>,
    /// Tool definitions, omitted when no tools are available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Raw completion payload as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletion {
    /// Completion with a single plain-text choice.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChatChoice {
                message: Some(AssistantMessage {
                    content: Some(content.into()),
                    tool_calls: Vec::new(),
                }),
            }],
        }
    }

    /// Completion with a single choice requesting tool calls.
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            choices: vec![ChatChoice {
                message: Some(AssistantMessage {
                    content: None,
                    tool_calls,
                }),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatChoice {
    /// Providers occasionally return a choice without a message.
    #[serde(default)]
    pub message: Option<AssistantMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// Chat-completion model used by the reasoning loop.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one completion request.
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError>;
}
