//! Product collection across the tool results of one turn.

use concierge_rs_protocol::{Product, ToolExecutionResult, ToolOutcome};
use std::collections::HashSet;

/// Products from successful results in issue order, de-duplicated by url
/// (or lower-cased name when a product has no url).
pub(crate) fn collect_products(results: &[ToolExecutionResult]) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();
    for result in results {
        let ToolOutcome::Success {
            products: found, ..
        } = &result.outcome
        else {
            continue;
        };
        for product in found {
            let key = match product.url.as_deref() {
                Some(url) if !url.trim().is_empty() => format!("url:{url}"),
                _ => format!("name:{}", product.name.trim().to_lowercase()),
            };
            if seen.insert(key) {
                products.push(product.clone());
            }
        }
    }
    products
}

/// Short text block describing the products, for hosts that render a shopping panel.
pub(crate) fn shopping_context(products: &[Product]) -> Option<String> {
    if products.is_empty() {
        return None;
    }
    let lines = products
        .iter()
        .map(|product| {
            let mut line = format!("- {}", product.name);
            if let Some(price) = product.price.as_deref() {
                line.push_str(&format!(" ({price})"));
            }
            if let Some(url) = product.url.as_deref() {
                line.push_str(&format!(": {url}"));
            }
            line
        })
        .collect::<Vec<_>>();
    Some(format!(
        "Products referenced this turn:\n{}",
        lines.join("\n")
    ))
}
