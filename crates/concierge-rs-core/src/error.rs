//! Error types for the core orchestration crate.

use concierge_rs_protocol::LlmError;
use thiserror::Error;

/// Errors that escape a reasoning-loop run.
///
/// Tool failures never appear here; they are recorded as tool outcomes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The model boundary returned an unusable payload (no choices, null message).
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// Transport or API failure from the model client, propagated unchanged.
    #[error(transparent)]
    Llm(#[from] LlmError),
}
