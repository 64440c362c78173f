//! The inbound chat entry point.
//!
//! [`ChatService::generate_chat_responses`] runs one user turn on a spawned
//! task and hands back the frames as a stream. Frame order within a turn:
//! optional `checkpoint` (new sessions only), then `content` /
//! `search_start` / `search_results` as the run produces them, an optional
//! `error`, and exactly one `end`. A canceled turn stops without `end`.

use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::bridge::{HttpSummaryStore, InMemorySummaryStore, SaveOutcome, SummaryKey, SummaryStore};
use crate::config::CounselConfig;
use crate::error::{CounselError, Result};
use crate::graph::{ConversationGraph, ConversationState, EventSink, RunEvent, DEFAULT_MAX_TOOL_ROUNDS};
use crate::memory::CompactionOutcome;
use crate::prompts::{system_prompt_for, PREVIOUS_SUMMARY_PREFIX};
use crate::provider::{create_provider, ModelProvider};
use crate::session::{RegistrySettings, Session, SessionRegistry};
use crate::stream::{Frame, FrameEncoder};
use crate::tools::{web_search_tool, TavilyClient, Tool, ToolInvoker};
use crate::types::{GenerationSettings, Message};

/// Frames buffered between the turn task and the consumer.
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

/// One inbound user turn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub checkpoint_id: Option<String>,
    pub clerk_id: String,
    pub project_id: String,
    pub chat_type: String,
}

impl ChatRequest {
    pub fn summary_key(&self) -> SummaryKey {
        SummaryKey::new(&self.clerk_id, &self.project_id, &self.chat_type)
    }
}

/// Per-turn run settings.
#[derive(Debug, Clone, Builder)]
pub struct ChatSettings {
    #[builder(default = DEFAULT_MAX_TOOL_ROUNDS)]
    pub max_tool_rounds: usize,
    #[builder(default)]
    pub generation: GenerationSettings,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Wires provider, tools, sessions and the summary store into chat turns.
#[derive(Clone, Builder)]
pub struct ChatService {
    provider: Arc<dyn ModelProvider>,
    #[builder(default)]
    tools: ToolInvoker,
    summary_store: Arc<dyn SummaryStore>,
    #[builder(default = Arc::new(SessionRegistry::default()))]
    sessions: Arc<SessionRegistry>,
    #[builder(default)]
    settings: ChatSettings,
}

impl ChatService {
    /// Build the service from process configuration.
    ///
    /// Web search is registered only when a Tavily key is configured; without
    /// a summary API base, summaries stay in process.
    pub fn from_config(config: &CounselConfig) -> Result<Self> {
        let provider = create_provider(config)?;

        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
        match &config.tavily_api_key {
            Some(key) => {
                let client = TavilyClient::new(key.clone(), config.tavily_base_url.clone());
                tools.push(Arc::new(web_search_tool(client, config.search_max_results)));
            }
            None => tracing::warn!("TAVILY_API_KEY is not set; web search disabled"),
        }
        let tools = ToolInvoker::new(tools).with_timeout(config.tool_timeout());

        let summary_store: Arc<dyn SummaryStore> = match &config.summary_api_base {
            Some(base) => Arc::new(HttpSummaryStore::new(base)?),
            None => {
                tracing::warn!("SUMMARY_API_BASE is not set; summaries are kept in process");
                Arc::new(InMemorySummaryStore::new())
            }
        };

        let sessions = SessionRegistry::new(RegistrySettings {
            ttl: config.session_ttl(),
            max_sessions: config.max_sessions,
            memory_token_limit: config.memory_token_limit,
            memory_retained_turns: config.memory_retained_turns,
        });

        Ok(Self::builder()
            .provider(provider)
            .tools(tools)
            .summary_store(summary_store)
            .sessions(Arc::new(sessions))
            .settings(
                ChatSettings::builder()
                    .max_tool_rounds(config.max_tool_rounds)
                    .build(),
            )
            .build())
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Run one turn, streaming its frames.
    ///
    /// Dropping the returned stream cancels `cancel`, which stops the run
    /// and any in-flight tool calls.
    pub fn generate_chat_responses(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> ReceiverStream<Frame> {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let service = self.clone();

        tokio::spawn(async move {
            let watcher = {
                let tx = tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = tx.closed() => cancel.cancel(),
                        _ = cancel.cancelled() => {}
                    }
                })
            };
            service.run_turn(request, &tx, &cancel).await;
            watcher.abort();
        });

        ReceiverStream::new(rx)
    }

    async fn run_turn(&self, request: ChatRequest, tx: &mpsc::Sender<Frame>, cancel: &CancellationToken) {
        let resolved = self.sessions.resolve_or_create(request.checkpoint_id.as_deref());
        let checkpoint_id = resolved.checkpoint_id.clone();
        tracing::debug!(
            checkpoint_id = %checkpoint_id,
            is_new = resolved.is_new,
            chat_type = %request.chat_type,
            "chat turn started"
        );

        if resolved.is_new && tx.send(Frame::checkpoint(&checkpoint_id)).await.is_err() {
            cancel.cancel();
            return;
        }

        let mut session = tokio::select! {
            _ = cancel.cancelled() => return,
            guard = resolved.session.lock() => guard,
        };

        let key = request.summary_key();
        if !resolved.is_new {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => return,
                fetched = self.summary_store.fetch(&key) => fetched,
            };
            if let Some(summary) = fetched {
                if session.memory.hydrate_summary(&summary) {
                    tracing::debug!(checkpoint_id = %checkpoint_id, "hydrated memory from stored summary");
                }
            }
        }

        let state = initial_state(&session, &request);
        let graph = ConversationGraph::new(Arc::clone(&self.provider), self.tools.clone())
            .with_max_tool_rounds(self.settings.max_tool_rounds)
            .with_settings(self.settings.generation.clone());
        let mut sink = FrameSink {
            encoder: FrameEncoder,
            tx,
        };

        match graph.run(state, &mut sink, cancel).await {
            Ok(outcome) => {
                session.memory.append(request.message.as_str(), outcome.final_text);
                session.thread.turns += 1;
                self.compact_and_push(&mut session, &key).await;
            }
            Err(CounselError::Canceled) => {
                tracing::debug!(checkpoint_id = %checkpoint_id, "chat turn canceled");
                return;
            }
            Err(error) => {
                tracing::warn!(checkpoint_id = %checkpoint_id, error = %error, "chat turn failed");
                if tx.send(Frame::from_run_error(&error)).await.is_err() {
                    return;
                }
            }
        }

        if cancel.is_cancelled() {
            return;
        }
        let _ = tx.send(Frame::End).await;
        tracing::debug!(checkpoint_id = %checkpoint_id, "chat turn finished");
    }

    async fn compact_and_push(&self, session: &mut Session, key: &SummaryKey) {
        match session.memory.compact(self.provider.as_ref()).await {
            CompactionOutcome::Updated(summary) => match self.summary_store.push(key, &summary).await {
                SaveOutcome::Saved => {
                    tracing::debug!(checkpoint_id = %session.checkpoint_id, "summary saved")
                }
                SaveOutcome::Failed { reason } => tracing::warn!(
                    checkpoint_id = %session.checkpoint_id,
                    reason = %reason,
                    "summary push failed"
                ),
            },
            CompactionOutcome::Unchanged => {}
            CompactionOutcome::Failed(reason) => tracing::warn!(
                checkpoint_id = %session.checkpoint_id,
                reason = %reason,
                "summary compaction failed; keeping previous summary"
            ),
        }
    }
}

/// System prompt, prior-summary note, retained turns, then the new message.
fn initial_state(session: &Session, request: &ChatRequest) -> ConversationState {
    let mut messages = vec![Message::system(system_prompt_for(&request.chat_type))];
    if let Some(summary) = session.memory.moving_summary() {
        messages.push(Message::system(format!("{PREVIOUS_SUMMARY_PREFIX}{summary}")));
    }
    messages.extend(session.memory.context_messages());
    messages.push(Message::user(request.message.as_str()));
    ConversationState::new(messages)
}

struct FrameSink<'a> {
    encoder: FrameEncoder,
    tx: &'a mpsc::Sender<Frame>,
}

#[async_trait]
impl EventSink for FrameSink<'_> {
    async fn emit(&mut self, event: RunEvent) -> std::result::Result<(), CounselError> {
        if let Some(frame) = self.encoder.encode(&event) {
            self.tx.send(frame).await.map_err(|_| CounselError::Canceled)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("provider", &self.provider.provider_name())
            .field("tools", &self.tools)
            .field("sessions", &self.sessions.len())
            .field("settings", &self.settings)
            .finish()
    }
}
