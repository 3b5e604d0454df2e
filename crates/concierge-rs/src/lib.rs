//! Public SDK surface for Concierge.
//!
//! This crate re-exports the building blocks and wires the default tool
//! catalog and executor so hosts only supply a model client and tools.

/// Re-export for convenience.
pub use concierge_rs_config as config;
pub use concierge_rs_core as core;
/// Re-export for convenience.
pub use concierge_rs_memory as memory;
/// Re-export for convenience.
pub use concierge_rs_protocol as protocol;
pub use concierge_rs_tools as tools;

pub use concierge_rs_config::ConciergeConfig;
pub use concierge_rs_core::{Conversation, CoreError, LogTelemetry, ReasoningLoop};
pub use concierge_rs_protocol::{ChatMessage, ChatModel, TurnResult};
pub use concierge_rs_tools::ToolRegistry;

use concierge_rs_tools::{ParallelToolExecutor, RegistryToolCatalog};
use log::debug;
use std::sync::Arc;

/// Build a reasoning loop that serves every tool in `registry`.
pub fn reasoning_loop(
    llm: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    config: &ConciergeConfig,
) -> ReasoningLoop {
    debug!(
        "building reasoning loop (tools={}, max_search_iterations={})",
        registry.list().len(),
        config.orchestrator.effective_max_search_iterations()
    );
    ReasoningLoop::new(
        llm,
        Arc::new(RegistryToolCatalog::new(registry.clone())),
        Arc::new(ParallelToolExecutor::new(registry)),
        config,
    )
}

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Hosts are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_rs_protocol::{ChatCompletion, ToolCall};
    use concierge_rs_test_utils::{DummyTool, ScriptedLLM, search_hit};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn default_wiring_runs_registered_tools() {
        init_logging();
        let registry = ToolRegistry::new();
        registry.register(Arc::new(
            DummyTool::new("search_products")
                .with_source("catalog")
                .with_results(vec![search_hit("Trail Boot", "https://shop.example.com/boot")]),
        ));
        let llm = Arc::new(ScriptedLLM::new([
            ChatCompletion::tool_calls(vec![ToolCall::new(
                "call_1",
                "search_products",
                r#"{"query":"boots"}"#,
            )]),
            ChatCompletion::text("We have the Trail Boot."),
        ]));
        let config = ConciergeConfig::default();
        let reasoning = reasoning_loop(llm, registry, &config);
        let mut conversation = Conversation::from_config(&config);

        let result = conversation
            .handle_turn(&reasoning, Vec::new(), "Any boots?", "localhost", Some(&LogTelemetry))
            .await
            .expect("turn");
        assert_eq!(result.final_response, "We have the Trail Boot.");
        assert_eq!(result.all_search_results.len(), 1);
        assert_eq!(conversation.memory().current_turn(), 1);
    }
}
