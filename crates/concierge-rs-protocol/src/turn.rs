//! Result of one orchestrated conversation turn.

use crate::{Product, SearchResult};
use serde::{Deserialize, Serialize};

/// One executed tool call as recorded in the turn's search log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchLogEntry {
    pub tool: String,
    pub query: String,
    pub result_count: usize,
    pub source: String,
}

/// Final output of a reasoning-loop run; owned by the caller after return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TurnResult {
    pub final_response: String,
    /// Number of completion round-trips performed.
    pub iteration: u32,
    /// Result items of every successful tool call, in issue order.
    pub all_search_results: Vec<SearchResult>,
    /// One entry per executed tool call, in issue order.
    pub search_log: Vec<SearchLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_context: Option<String>,
}
