//! Transcript sanitization before a provider request.
//!
//! Chat-completions backends reject a transcript where an assistant tool call
//! has no matching tool message, or where a tool message answers a call that
//! the preceding assistant turn never made.

use std::collections::{HashMap, HashSet};

use crate::types::{Message, ToolResult};

/// Pair every assistant tool call with exactly one tool message, in call order.
///
/// Orphan tool messages are dropped; calls without a result get a synthetic
/// error result.
pub fn sanitize_tool_pairing(messages: &[Message]) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::with_capacity(messages.len());
    let mut seen_tool_results: HashSet<String> = HashSet::new();

    let mut i = 0usize;
    while i < messages.len() {
        let msg = &messages[i];
        let tool_calls = match msg {
            Message::AssistantToolCalls { tool_calls, .. } => tool_calls,
            Message::Tool(_) => {
                i += 1;
                continue;
            }
            _ => {
                out.push(msg.clone());
                i += 1;
                continue;
            }
        };

        let tool_call_ids: HashSet<&str> = tool_calls.iter().map(|tc| tc.id.as_str()).collect();
        let mut span_results: HashMap<String, Message> = HashMap::new();

        let mut j = i + 1;
        while let Some(Message::Tool(result)) = messages.get(j) {
            if tool_call_ids.contains(result.tool_call_id.as_str())
                && seen_tool_results.insert(result.tool_call_id.clone())
            {
                span_results.insert(result.tool_call_id.clone(), Message::Tool(result.clone()));
            }
            j += 1;
        }

        out.push(msg.clone());
        for call in tool_calls {
            match span_results.remove(&call.id) {
                Some(existing) => out.push(existing),
                None => out.push(Message::Tool(ToolResult::failed(
                    call,
                    "missing tool result in transcript; inserted synthetic error result",
                ))),
            }
        }
        i = j;
    }

    out
}
