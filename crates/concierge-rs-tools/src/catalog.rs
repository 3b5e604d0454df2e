//! Domain-scoped tool discovery and usage instructions.

use crate::registry::ToolRegistry;
use async_trait::async_trait;
use concierge_rs_protocol::ToolDefinition;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capability flags for a domain, keyed by tool or provider name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAvailability {
    pub providers: BTreeMap<String, bool>,
}

impl ToolAvailability {
    pub fn with(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.providers.insert(name.into(), enabled);
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.providers.get(name).copied().unwrap_or(false)
    }

    /// Names of enabled entries, sorted.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.providers
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
    }
}

/// Source of tool definitions and instructions for a storefront domain.
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    /// Tools the model may call for this domain.
    async fn available_tools(&self, domain: &str) -> Vec<ToolDefinition>;
    /// Which tools and commerce providers are usable for this domain.
    async fn check_availability(&self, domain: &str) -> ToolAvailability;
    /// Instruction block appended to the system message; empty when nothing is available.
    fn tool_instructions(&self, availability: &ToolAvailability) -> String;
}

/// Catalog backed by a [`ToolRegistry`]; every domain sees the same tools.
#[derive(Clone, Default)]
pub struct RegistryToolCatalog {
    registry: ToolRegistry,
    providers: BTreeMap<String, bool>,
}

impl RegistryToolCatalog {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            providers: BTreeMap::new(),
        }
    }

    /// Record a commerce provider flag reported by availability checks.
    pub fn with_provider(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.providers.insert(name.into(), enabled);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[async_trait]
impl ToolCatalog for RegistryToolCatalog {
    async fn available_tools(&self, domain: &str) -> Vec<ToolDefinition> {
        let tools = self
            .registry
            .specs()
            .iter()
            .map(|spec| spec.to_definition())
            .collect::<Vec<_>>();
        debug!(
            "resolved available tools (domain={}, count={})",
            domain,
            tools.len()
        );
        tools
    }

    async fn check_availability(&self, domain: &str) -> ToolAvailability {
        let mut availability = ToolAvailability {
            providers: self.providers.clone(),
        };
        for name in self.registry.list() {
            availability.providers.insert(name, true);
        }
        debug!(
            "checked tool availability (domain={}, entries={})",
            domain,
            availability.providers.len()
        );
        availability
    }

    fn tool_instructions(&self, availability: &ToolAvailability) -> String {
        let tools = self
            .registry
            .specs()
            .into_iter()
            .filter(|spec| availability.has(&spec.name))
            .collect::<Vec<_>>();
        if tools.is_empty() {
            return String::new();
        }

        let mut lines = vec!["## Available tools".to_string()];
        lines.extend(
            tools
                .iter()
                .map(|spec| format!("- `{}`: {}", spec.name, spec.description)),
        );
        let providers = availability
            .enabled()
            .filter(|name| self.providers.contains_key(*name))
            .collect::<Vec<_>>();
        if !providers.is_empty() {
            lines.push(format!("Connected commerce providers: {}", providers.join(", ")));
        }
        lines.push(
            "Use these tools to look up products and orders before answering; never invent \
             prices, stock levels, or links."
                .to_string(),
        );
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tool, ToolContext, ToolOutput};
    use concierge_rs_protocol::ToolError;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[derive(Debug)]
    struct NamedTool(&'static str, &'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            self.1
        }

        fn args_schema(&self) -> Value {
            json!({ "type": "object", "properties": { "query": { "type": "string" } } })
        }

        async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::default())
        }
    }

    #[tokio::test]
    async fn empty_registry_has_no_tools_or_instructions() {
        let catalog = RegistryToolCatalog::default();
        assert!(catalog.available_tools("shop.example.com").await.is_empty());
        let availability = catalog.check_availability("shop.example.com").await;
        assert_eq!(catalog.tool_instructions(&availability), "");
    }

    #[tokio::test]
    async fn catalog_lists_tools_sorted_with_provider_flags() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("search_products", "Search the catalog")));
        registry.register(Arc::new(NamedTool("lookup_order", "Find an order")));
        let catalog = RegistryToolCatalog::new(registry)
            .with_provider("shopify", true)
            .with_provider("woocommerce", false);

        let names = catalog
            .available_tools("shop.example.com")
            .await
            .into_iter()
            .map(|tool| tool.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["lookup_order", "search_products"]);

        let availability = catalog.check_availability("shop.example.com").await;
        assert!(availability.has("shopify"));
        assert!(!availability.has("woocommerce"));
        assert!(availability.has("search_products"));

        let instructions = catalog.tool_instructions(&availability);
        assert!(instructions.starts_with(
            "## Available tools\n- `lookup_order`: Find an order\n- `search_products`: Search the catalog\n"
        ));
        assert!(instructions.contains("Connected commerce providers: shopify\n"));
    }
}
