//! Conversation state and routing.

use crate::types::Message;

/// Ordered messages of one state machine run.
///
/// Owned by a single run; never shared between concurrent runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Text of the final assistant message, if the run ended on one.
    pub fn final_text(&self) -> Option<&str> {
        match self.messages.last() {
            Some(Message::Assistant { content }) => Some(content),
            _ => None,
        }
    }
}

/// Node of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GraphState {
    Model,
    Tool,
    Done,
}

/// Route after a `Model` step: tool calls go to `Tool`, anything else ends.
pub fn tools_router(state: &ConversationState) -> GraphState {
    match state.last() {
        Some(Message::AssistantToolCalls { .. }) => GraphState::Tool,
        _ => GraphState::Done,
    }
}
