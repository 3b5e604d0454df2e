//! Conversational orchestration: the bounded tool-calling loop, prompt
//! composition, link sanitization, and the per-conversation turn driver.

pub mod conversation;
pub mod error;
pub mod links;
pub mod orchestrator;
pub mod prompt;
pub mod telemetry;

pub use conversation::Conversation;
pub use error::CoreError;
pub use links::{AllowedHostsSanitizer, LINK_REMOVED, LinkSanitizer, NoopLinkSanitizer};
pub use orchestrator::{EXHAUSTED_FALLBACK, NO_RESPONSE_FALLBACK, ReasoningLoop};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, get_enhanced_prompt};
pub use telemetry::LogTelemetry;
