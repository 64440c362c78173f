//! Shared test helpers: a scripted provider, a fake search tool and frame collection.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use counsel::error::CounselError;
use counsel::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use counsel::stream::Frame;
use counsel::tools::{AgentTool, Tool, ToolParameters, WEB_SEARCH_TOOL_NAME};
use counsel::types::*;

/// One scripted `stream_text` reply.
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Stream the text in small chunks, then finish.
    Text(String),
    /// Request these tool calls, optionally after some text.
    ToolCalls { text: String, calls: Vec<ToolCallRequest> },
    /// A malformed chunk in the middle of otherwise valid text.
    MalformedThenText(String),
    /// Fail to open the stream.
    OpenError,
    /// Fail after the first chunk.
    MidStreamError(String),
    /// Open the stream and never produce anything.
    Stall,
}

/// A provider that replays queued stream scripts and summaries, and records requests.
pub struct MockProvider {
    streams: Mutex<VecDeque<StreamScript>>,
    summaries: Mutex<VecDeque<Result<String, String>>>,
    stream_requests: Mutex<Vec<ProviderRequest>>,
    summary_requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(VecDeque::new()),
            summaries: Mutex::new(VecDeque::new()),
            stream_requests: Mutex::new(Vec::new()),
            summary_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn queue_text(&self, text: &str) {
        self.queue_stream(StreamScript::Text(text.to_string()));
    }

    pub fn queue_tool_calls(&self, calls: Vec<ToolCallRequest>) {
        self.queue_stream(StreamScript::ToolCalls {
            text: String::new(),
            calls,
        });
    }

    pub fn queue_stream(&self, script: StreamScript) {
        self.streams.lock().unwrap().push_back(script);
    }

    pub fn queue_summary(&self, text: &str) {
        self.summaries.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn queue_summary_error(&self, message: &str) {
        self.summaries.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn stream_requests(&self) -> Vec<ProviderRequest> {
        self.stream_requests.lock().unwrap().clone()
    }

    pub fn summary_requests(&self) -> Vec<ProviderRequest> {
        self.summary_requests.lock().unwrap().clone()
    }
}

fn chunks(text: &str) -> Vec<String> {
    text.chars()
        .collect::<Vec<_>>()
        .chunks(5)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, CounselError> {
        self.summary_requests.lock().unwrap().push(request.clone());
        let next = self
            .summaries
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock summary".to_string()));
        match next {
            Ok(text) => Ok(ProviderResponse {
                text,
                tool_calls: Vec::new(),
                finish_reason: Some(FinishReason::Stop),
            }),
            Err(message) => Err(CounselError::Inference(message)),
        }
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, CounselError>>, CounselError> {
        self.stream_requests.lock().unwrap().push(request.clone());
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| StreamScript::Text("Mock streamed response".to_string()));

        let stream = match script {
            StreamScript::Text(text) => async_stream::stream! {
                for chunk in chunks(&text) {
                    yield Ok(TextStreamDelta::text(chunk));
                }
                yield Ok(TextStreamDelta::done(Some(FinishReason::Stop)));
            }
            .boxed(),
            StreamScript::ToolCalls { text, calls } => async_stream::stream! {
                for chunk in chunks(&text) {
                    yield Ok(TextStreamDelta::text(chunk));
                }
                for call in calls {
                    yield Ok(TextStreamDelta::tool_call(call));
                }
                yield Ok(TextStreamDelta::done(Some(FinishReason::ToolCalls)));
            }
            .boxed(),
            StreamScript::MalformedThenText(text) => async_stream::stream! {
                let mut parts = chunks(&text).into_iter();
                if let Some(first) = parts.next() {
                    yield Ok(TextStreamDelta::text(first));
                }
                let malformed = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
                yield Err(CounselError::Serialization(malformed));
                for part in parts {
                    yield Ok(TextStreamDelta::text(part));
                }
                yield Ok(TextStreamDelta::done(Some(FinishReason::Stop)));
            }
            .boxed(),
            StreamScript::OpenError => return Err(CounselError::api(500, "upstream exploded")),
            StreamScript::MidStreamError(first) => async_stream::stream! {
                yield Ok(TextStreamDelta::text(first));
                yield Err(CounselError::Stream("connection reset".to_string()));
            }
            .boxed(),
            StreamScript::Stall => futures::stream::pending().boxed(),
        };
        Ok(stream)
    }
}

pub fn search_call(id: &str, query: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: WEB_SEARCH_TOOL_NAME.to_string(),
        arguments: serde_json::json!({ "query": query }),
    }
}

/// A `web_search` tool that answers every query with the given URLs.
pub fn fake_search_tool(urls: &[&str]) -> Arc<dyn Tool> {
    let hits: Vec<serde_json::Value> = urls
        .iter()
        .map(|url| serde_json::json!({ "url": url, "title": "result", "content": "snippet" }))
        .collect();
    Arc::new(AgentTool::new(
        WEB_SEARCH_TOOL_NAME,
        "fake search",
        ToolParameters::object().string("query", "query", true).build(),
        move |_args, _ctx| {
            let hits = hits.clone();
            async move { Ok(serde_json::Value::Array(hits)) }
        },
    ))
}

/// A `web_search` tool that always fails.
pub fn failing_search_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        WEB_SEARCH_TOOL_NAME,
        "broken search",
        ToolParameters::object().string("query", "query", true).build(),
        |_args, _ctx| async move {
            Err(CounselError::ToolExecution {
                tool_name: WEB_SEARCH_TOOL_NAME.to_string(),
                message: "search backend unavailable".to_string(),
            })
        },
    ))
}

/// Drain a frame stream, failing the test if it does not finish in time.
pub async fn collect_frames(stream: impl futures::Stream<Item = Frame>) -> Vec<Frame> {
    tokio::time::timeout(Duration::from_secs(10), stream.collect::<Vec<_>>())
        .await
        .expect("frame stream did not finish")
}

/// Concatenated `content` frames.
pub fn content_text(frames: &[Frame]) -> String {
    frames
        .iter()
        .filter_map(|frame| match frame {
            Frame::Content { content } => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

/// The `type` tags of the frames, in order.
pub fn frame_kinds(frames: &[Frame]) -> Vec<String> {
    frames
        .iter()
        .map(|frame| serde_json::to_value(frame).unwrap()["type"].as_str().unwrap().to_string())
        .collect()
}
