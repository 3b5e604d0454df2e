use concierge_rs_tools::ToolContext;
use std::time::Duration;

pub fn base_tool_context() -> ToolContext {
    ToolContext::new(
        "shop.example.com",
        "call_test",
        "dummy",
        Duration::from_secs(5),
    )
}
