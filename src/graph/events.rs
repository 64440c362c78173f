//! Events emitted while a run is in progress.

use async_trait::async_trait;

use crate::error::CounselError;
use crate::types::{ToolCallRequest, ToolResult};

/// A live event of a run, emitted in production order.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Incremental assistant text.
    Token { text: String },
    ToolStarted { call: ToolCallRequest },
    ToolFinished { call: ToolCallRequest, result: ToolResult },
}

/// Receiver of run events.
///
/// An `Err` from `emit` stops the run; sinks return `Canceled` once their
/// consumer has gone away.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: RunEvent) -> Result<(), CounselError>;
}

#[async_trait]
impl EventSink for Vec<RunEvent> {
    async fn emit(&mut self, event: RunEvent) -> Result<(), CounselError> {
        self.push(event);
        Ok(())
    }
}
