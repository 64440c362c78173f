//! Wire frames of the chat stream and the encoder that produces them.
//!
//! Each frame is a JSON object tagged by `type`, written as one SSE event:
//! `data: <json>\n\n`.

use serde::{Deserialize, Serialize};

use crate::error::CounselError;
use crate::graph::RunEvent;
use crate::tools::web_search::{result_urls, WEB_SEARCH_TOOL_NAME};

/// One frame of the outbound stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// First frame of a newly created session.
    Checkpoint { checkpoint_id: String },
    Content { content: String },
    SearchStart { query: String },
    SearchResults { urls: Vec<String> },
    /// Terminal failure of the turn; always followed by `End`.
    Error { reason: String },
    End,
}

impl Frame {
    pub fn checkpoint(checkpoint_id: impl Into<String>) -> Self {
        Self::Checkpoint {
            checkpoint_id: checkpoint_id.into(),
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self::Content {
            content: content.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
        }
    }

    /// The error frame for a failed run.
    pub fn from_run_error(error: &CounselError) -> Self {
        Self::error(error.stream_reason())
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// The JSON payload of this frame.
    pub fn to_json(&self) -> String {
        // Every variant serializes to a plain JSON object.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error","reason":"encoding_failed"}"#.to_string())
    }

    /// The frame as a complete SSE event.
    pub fn to_sse(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }
}

/// Maps run events to frames.
///
/// Text becomes `content`; a `web_search` call becomes `search_start` when
/// issued and `search_results` when finished. Other tools are not surfaced.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameEncoder;

impl FrameEncoder {
    pub fn encode(&self, event: &RunEvent) -> Option<Frame> {
        match event {
            RunEvent::Token { text } if !text.is_empty() => Some(Frame::content(text.clone())),
            RunEvent::Token { .. } => None,
            RunEvent::ToolStarted { call } if call.name == WEB_SEARCH_TOOL_NAME => {
                let query = call
                    .arguments
                    .get("query")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(Frame::SearchStart { query })
            }
            RunEvent::ToolFinished { call, result } if call.name == WEB_SEARCH_TOOL_NAME => {
                let urls = if result.success {
                    result_urls(&result.content)
                } else {
                    Vec::new()
                };
                Some(Frame::SearchResults { urls })
            }
            RunEvent::ToolStarted { .. } | RunEvent::ToolFinished { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolCallRequest, ToolResult};
    use pretty_assertions::assert_eq;

    fn search_call() -> ToolCallRequest {
        ToolCallRequest {
            id: "c1".into(),
            name: WEB_SEARCH_TOOL_NAME.into(),
            arguments: serde_json::json!({ "query": "bakery prices austin" }),
        }
    }

    #[test]
    fn frames_serialize_to_wire_shapes() {
        assert_eq!(
            Frame::checkpoint("abc").to_sse(),
            "data: {\"type\":\"checkpoint\",\"checkpoint_id\":\"abc\"}\n\n"
        );
        assert_eq!(Frame::content("Hi").to_json(), r#"{"type":"content","content":"Hi"}"#);
        assert_eq!(
            Frame::SearchResults { urls: vec!["https://a".into()] }.to_json(),
            r#"{"type":"search_results","urls":["https://a"]}"#
        );
        assert_eq!(Frame::error("timeout").to_json(), r#"{"type":"error","reason":"timeout"}"#);
        assert_eq!(Frame::End.to_sse(), "data: {\"type\":\"end\"}\n\n");
    }

    #[test]
    fn run_errors_map_to_reasons() {
        let frame = Frame::from_run_error(&CounselError::ToolLoopExceeded { rounds: 10 });
        assert_eq!(frame, Frame::error("tool_loop_exceeded"));
        let frame = Frame::from_run_error(&CounselError::Inference("boom".into()));
        assert_eq!(frame, Frame::error("inference_failed"));
    }

    #[test]
    fn search_events_become_search_frames() {
        let encoder = FrameEncoder;
        let call = search_call();
        assert_eq!(
            encoder.encode(&RunEvent::ToolStarted { call: call.clone() }),
            Some(Frame::SearchStart {
                query: "bakery prices austin".into()
            })
        );

        let output = serde_json::json!([{ "url": "https://x.example", "title": "X", "content": "" }]);
        let finished = RunEvent::ToolFinished {
            call: call.clone(),
            result: ToolResult::ok(&call, &output),
        };
        assert_eq!(
            encoder.encode(&finished),
            Some(Frame::SearchResults {
                urls: vec!["https://x.example".into()]
            })
        );

        let failed = RunEvent::ToolFinished {
            call: call.clone(),
            result: ToolResult::failed(&call, "timeout"),
        };
        assert_eq!(encoder.encode(&failed), Some(Frame::SearchResults { urls: vec![] }));
    }

    #[test]
    fn empty_tokens_and_other_tools_are_dropped() {
        let encoder = FrameEncoder;
        assert_eq!(encoder.encode(&RunEvent::Token { text: String::new() }), None);
        let other = ToolCallRequest {
            id: "c2".into(),
            name: "calculator".into(),
            arguments: serde_json::json!({}),
        };
        assert_eq!(encoder.encode(&RunEvent::ToolStarted { call: other }), None);
    }
}
