//! Conversation state machine: `Model` → (`Tool` → `Model`)* → `Done`.

pub mod events;
pub mod runner;
pub mod state;

pub use events::{EventSink, RunEvent};
pub use runner::{ConversationGraph, RunOutcome, DEFAULT_MAX_TOOL_ROUNDS};
pub use state::{tools_router, ConversationState, GraphState};
