//! Tool system for function calling.

pub mod arguments;
pub mod invoker;
pub mod tool;
pub mod types;
pub mod validation;
pub mod web_search;

pub use arguments::ToolArguments;
pub use invoker::ToolInvoker;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::ToolParameters;
pub use web_search::{web_search_tool, SearchHit, TavilyClient, WEB_SEARCH_TOOL_NAME};
