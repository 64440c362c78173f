//! Message types for model communication.
//!
//! Assistant turns come in two shapes: plain text, or text plus one or more
//! tool-call requests. They are separate variants so routing after a model
//! step is a match on the message rather than a probe for optional fields.

use serde::{Deserialize, Serialize};

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
    },
    AssistantToolCalls {
        content: String,
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool(ToolResult),
}

impl Message {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            content: text.into(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: text.into(),
        }
    }

    /// Create an assistant message without tool calls.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: text.into(),
        }
    }

    /// Create an assistant message carrying tool calls.
    ///
    /// An empty call list yields a plain [`Message::Assistant`].
    pub fn assistant_with_calls(text: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        if tool_calls.is_empty() {
            Self::assistant(text)
        } else {
            Self::AssistantToolCalls {
                content: text.into(),
                tool_calls,
            }
        }
    }

    /// Create a tool result message.
    pub fn tool(result: ToolResult) -> Self {
        Self::Tool(result)
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } | Self::AssistantToolCalls { .. } => Role::Assistant,
            Self::Tool(_) => Role::Tool,
        }
    }

    /// The text content of this message.
    pub fn text(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content }
            | Self::AssistantToolCalls { content, .. } => content,
            Self::Tool(result) => &result.content,
        }
    }

    /// Tool calls requested by this message (empty unless assistant-with-calls).
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::AssistantToolCalls { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The outcome of one tool call, linked to its request by `tool_call_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub content: String,
    #[serde(default)]
    pub success: bool,
}

impl ToolResult {
    pub fn ok(call: &ToolCallRequest, output: &serde_json::Value) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content: output.to_string(),
            success: true,
        }
    }

    pub fn failed(call: &ToolCallRequest, error: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content: serde_json::json!({ "error": error.into() }).to_string(),
            success: false,
        }
    }
}
