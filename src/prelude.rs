//! Convenience re-exports for common use.

pub use crate::bridge::{InMemorySummaryStore, SaveOutcome, SummaryKey, SummaryStore};
pub use crate::chat::{ChatRequest, ChatService, ChatSettings};
pub use crate::config::CounselConfig;
pub use crate::error::{CounselError, Result};
pub use crate::provider::ModelProvider;
pub use crate::stream::Frame;
pub use crate::tools::{AgentTool, Tool, ToolArguments, ToolInvoker, ToolParameters};
pub use crate::types::{GenerationSettings, Message, Role, TextStreamDelta, ToolCallRequest, ToolResult};
pub use tokio_util::sync::CancellationToken;
