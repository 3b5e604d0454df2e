//! Tool interfaces, catalog, and parallel execution for Concierge.

pub mod catalog;
pub mod context;
pub mod executor;
pub mod format;
pub mod output_policy;
pub mod registry;
pub mod tool;

/// Domain-scoped tool discovery.
pub use catalog::{RegistryToolCatalog, ToolAvailability, ToolCatalog};
/// Per-invocation tool context.
pub use context::ToolContext;
/// Batch tool execution.
pub use executor::{ParallelToolExecutor, ToolExecutor};
/// Rendering of tool results for the model.
pub use format::{ToolResultMessage, format_tool_results_for_ai};
/// Tool output policy.
pub use output_policy::ToolOutputPolicy;
/// Tool registry type.
pub use registry::ToolRegistry;
/// Tool trait, spec, and output types.
pub use tool::{Tool, ToolOutput, ToolSpec};
