use async_trait::async_trait;
use concierge_rs_protocol::{Product, SearchResult, ToolError};
use concierge_rs_tools::{ToolContext, ToolOutput};
use serde_json::{Value, json};
use std::time::Duration;

pub fn search_hit(title: &str, url: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: Some(url.to_string()),
        content: format!("{title} details"),
        metadata: Value::Null,
    }
}

/// Tool returning canned results, optionally after a delay or with an error.
#[derive(Debug, Clone)]
pub struct DummyTool {
    name: String,
    description: String,
    args_schema: Value,
    source: String,
    results: Vec<SearchResult>,
    products: Vec<Product>,
    delay: Option<Duration>,
    error: Option<ToolError>,
}

impl DummyTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "dummy".to_string(),
            args_schema: json!({ "type": "object" }),
            source: "dummy".to_string(),
            results: Vec::new(),
            products: Vec::new(),
            delay: None,
            error: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_results(mut self, results: Vec<SearchResult>) -> Self {
        self.results = results;
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_error(mut self, error: ToolError) -> Self {
        self.error = Some(error);
        self
    }
}

#[async_trait]
impl concierge_rs_tools::Tool for DummyTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn args_schema(&self) -> Value {
        self.args_schema.clone()
    }

    async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<ToolOutput, ToolError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(ToolOutput::new(self.source.clone(), self.results.clone())
            .with_products(self.products.clone()))
    }
}
