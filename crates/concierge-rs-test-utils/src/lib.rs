//! Test helpers shared across Concierge crates.

pub mod catalog;
pub mod context;
pub mod executor;
pub mod llm;
pub mod telemetry;
pub mod tools;

pub use catalog::StubCatalog;
pub use context::base_tool_context;
pub use executor::ReorderingExecutor;
pub use llm::{FailingLLM, ScriptedLLM};
pub use telemetry::{LoggedLine, RecordingTelemetry};
pub use tools::{DummyTool, search_hit};
