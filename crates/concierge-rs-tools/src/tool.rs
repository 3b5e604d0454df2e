//! Tool trait definition and metadata spec.

use crate::context::ToolContext;
use async_trait::async_trait;
use concierge_rs_protocol::{Product, SearchResult, ToolDefinition, ToolError, ToolOutcome};
use serde_json::Value;
use std::fmt::Debug;

/// Tool metadata spec for discovery and schema presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for tool arguments.
    pub args_schema: Value,
}

impl ToolSpec {
    /// Definition advertised to the model.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.args_schema.clone(),
        }
    }
}

/// Successful tool output before it is wrapped into a [`ToolOutcome`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Where the results came from ("catalog", "semantic", "orders", ...).
    pub source: String,
    pub results: Vec<SearchResult>,
    pub products: Vec<Product>,
}

impl ToolOutput {
    pub fn new(source: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            source: source.into(),
            results,
            products: Vec::new(),
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn into_outcome(self) -> ToolOutcome {
        ToolOutcome::Success {
            results: self.results,
            source: self.source,
            products: self.products,
        }
    }
}

/// Interface for executable tools.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Return the tool name.
    fn name(&self) -> &str;
    /// Return the tool description.
    fn description(&self) -> &str;
    /// Return the JSON schema for tool arguments.
    fn args_schema(&self) -> Value;

    /// Whether the tool is safe to run alongside others. Advisory only.
    fn supports_parallel(&self) -> bool {
        true
    }

    /// Invoke the tool with a context and parsed arguments.
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError>;

    /// Build a `ToolSpec` describing this tool.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            args_schema: self.args_schema(),
        }
    }
}
