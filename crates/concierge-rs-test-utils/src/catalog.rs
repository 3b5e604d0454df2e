use async_trait::async_trait;
use concierge_rs_protocol::ToolDefinition;
use concierge_rs_tools::{ToolAvailability, ToolCatalog};
use serde_json::json;

/// Catalog with a fixed tool list and instruction text for every domain.
#[derive(Debug, Clone, Default)]
pub struct StubCatalog {
    tools: Vec<ToolDefinition>,
    instructions: String,
}

impl StubCatalog {
    /// Catalog exposing no tools and no instructions.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.tools.push(ToolDefinition {
            description: format!("{name} tool"),
            name,
            parameters: json!({ "type": "object" }),
        });
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }
}

#[async_trait]
impl ToolCatalog for StubCatalog {
    async fn available_tools(&self, _domain: &str) -> Vec<ToolDefinition> {
        self.tools.clone()
    }

    async fn check_availability(&self, _domain: &str) -> ToolAvailability {
        self.tools
            .iter()
            .fold(ToolAvailability::default(), |availability, tool| {
                availability.with(tool.name.clone(), true)
            })
    }

    fn tool_instructions(&self, _availability: &ToolAvailability) -> String {
        self.instructions.clone()
    }
}
