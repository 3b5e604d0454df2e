use async_trait::async_trait;
use concierge_rs_protocol::{ChatCompletion, ChatModel, ChatRequest, LlmError};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Replays queued completions in order and records every request it receives.
///
/// Once the script runs out it answers with an [`LlmError::InvalidResponse`].
#[derive(Debug, Default)]
pub struct ScriptedLLM {
    script: Mutex<VecDeque<Result<ChatCompletion, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLLM {
    pub fn new(completions: impl IntoIterator<Item = ChatCompletion>) -> Self {
        Self {
            script: Mutex::new(completions.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, completion: ChatCompletion) -> Self {
        self.script.lock().push_back(Ok(completion));
        self
    }

    pub fn then_error(self, error: LlmError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedLLM {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        self.requests.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }
}

/// Always fails with the configured error.
#[derive(Debug, Clone)]
pub struct FailingLLM {
    error: LlmError,
}

impl FailingLLM {
    pub fn new(error: LlmError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl ChatModel for FailingLLM {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        Err(self.error.clone())
    }
}
