//! Drives one user turn through the state machine.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::events::{EventSink, RunEvent};
use super::state::{tools_router, ConversationState, GraphState};
use crate::error::CounselError;
use crate::provider::{sanitize_tool_pairing, ModelProvider, ProviderRequest};
use crate::tools::ToolInvoker;
use crate::types::{GenerationSettings, Message, StreamEventType, ToolCallRequest};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;
const DEFAULT_STREAM_IDLE_TIMEOUT_MS: u64 = 120_000;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Text of the final assistant message.
    pub final_text: String,
    pub state: ConversationState,
    pub tool_rounds: usize,
}

/// The `model` / `tool` graph bound to a provider and a tool registry.
#[derive(Clone)]
pub struct ConversationGraph {
    provider: Arc<dyn ModelProvider>,
    tools: ToolInvoker,
    max_tool_rounds: usize,
    settings: GenerationSettings,
}

impl ConversationGraph {
    pub fn new(provider: Arc<dyn ModelProvider>, tools: ToolInvoker) -> Self {
        Self {
            provider,
            tools,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Run until a `Model` step produces no tool calls.
    ///
    /// Fails with `ToolLoopExceeded` when a `Tool` step would go past the
    /// round cap, `Canceled` when `cancel` fires or the sink goes away.
    pub async fn run(
        &self,
        mut state: ConversationState,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, CounselError> {
        let mut node = GraphState::Model;
        let mut tool_rounds = 0usize;

        loop {
            tracing::trace!(node = %node, tool_rounds, "graph step");
            match node {
                GraphState::Model => {
                    self.model_step(&mut state, sink, cancel).await?;
                    node = tools_router(&state);
                }
                GraphState::Tool => {
                    if tool_rounds >= self.max_tool_rounds {
                        return Err(CounselError::ToolLoopExceeded {
                            rounds: self.max_tool_rounds,
                        });
                    }
                    tool_rounds += 1;
                    self.tool_step(&mut state, sink, cancel).await?;
                    node = GraphState::Model;
                }
                GraphState::Done => break,
            }
        }

        let final_text = state.final_text().unwrap_or_default().to_string();
        tracing::debug!(tool_rounds, text_len = final_text.len(), "run complete");
        Ok(RunOutcome {
            final_text,
            state,
            tool_rounds,
        })
    }

    async fn model_step(
        &self,
        state: &mut ConversationState,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), CounselError> {
        let tools = (!self.tools.is_empty()).then(|| self.tools.definitions());
        let request = ProviderRequest {
            messages: sanitize_tool_pairing(&state.messages),
            settings: self.settings.clone(),
            tools,
        };

        let mut stream = tokio::select! {
            _ = cancel.cancelled() => return Err(CounselError::Canceled),
            opened = self.provider.stream_text(&request) => opened.map_err(into_inference_error)?,
        };

        let idle_timeout_ms = self
            .settings
            .stream_idle_timeout_ms
            .unwrap_or(DEFAULT_STREAM_IDLE_TIMEOUT_MS);
        let idle = Duration::from_millis(idle_timeout_ms);
        let idle_sleep = time::sleep(idle);
        tokio::pin!(idle_sleep);

        let mut text = String::new();
        let mut calls: Vec<ToolCallRequest> = Vec::new();

        loop {
            let delta = tokio::select! {
                _ = cancel.cancelled() => return Err(CounselError::Canceled),
                _ = &mut idle_sleep, if idle_timeout_ms > 0 => {
                    return Err(CounselError::Timeout(idle_timeout_ms));
                }
                delta = stream.next() => delta,
            };
            let Some(delta) = delta else { break };

            let delta = match delta {
                Ok(delta) => delta,
                Err(CounselError::Serialization(error)) => {
                    tracing::warn!(error = %error, "skipping malformed stream chunk");
                    continue;
                }
                Err(error) => return Err(into_inference_error(error)),
            };
            idle_sleep.as_mut().reset(time::Instant::now() + idle);

            match delta.event_type {
                StreamEventType::TextDelta => {
                    if delta.text.is_empty() {
                        continue;
                    }
                    text.push_str(&delta.text);
                    sink.emit(RunEvent::Token { text: delta.text }).await?;
                }
                StreamEventType::ToolCallDelta => {
                    if let Some(call) = delta.tool_call {
                        // Some compatible backends omit ids; those calls are never merged.
                        let existing = if call.id.is_empty() {
                            None
                        } else {
                            calls.iter_mut().find(|existing| existing.id == call.id)
                        };
                        match existing {
                            Some(existing) => *existing = call,
                            None => calls.push(call),
                        }
                    }
                }
                StreamEventType::Done => break,
                StreamEventType::Error => {
                    let message = if delta.text.is_empty() {
                        "stream error".to_string()
                    } else {
                        delta.text
                    };
                    return Err(CounselError::Inference(message));
                }
            }
        }

        tracing::debug!(text_len = text.len(), tool_calls = calls.len(), "model step complete");
        state.push(Message::assistant_with_calls(text, calls));
        Ok(())
    }

    async fn tool_step(
        &self,
        state: &mut ConversationState,
        sink: &mut dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), CounselError> {
        let calls = state
            .last()
            .map(|message| message.tool_calls().to_vec())
            .unwrap_or_default();

        for call in &calls {
            sink.emit(RunEvent::ToolStarted { call: call.clone() }).await?;
        }

        let results = self.tools.invoke_all(&calls, cancel).await;
        if cancel.is_cancelled() {
            return Err(CounselError::Canceled);
        }

        for (call, result) in calls.into_iter().zip(results) {
            sink.emit(RunEvent::ToolFinished {
                call,
                result: result.clone(),
            })
            .await?;
            state.push(Message::tool(result));
        }
        Ok(())
    }
}

fn into_inference_error(error: CounselError) -> CounselError {
    match error {
        CounselError::Canceled | CounselError::Timeout(_) | CounselError::Inference(_) => error,
        other => CounselError::Inference(other.to_string()),
    }
}

impl std::fmt::Debug for ConversationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationGraph")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}
