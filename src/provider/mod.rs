//! Model provider trait and implementations.

pub mod http;
pub mod sanitize;

#[cfg(feature = "openai")]
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::CounselConfig;
use crate::error::CounselError;
use crate::types::{FinishReason, GenerationSettings, Message, TextStreamDelta, ToolCallRequest};

pub use sanitize::sanitize_tool_pairing;

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

impl ProviderRequest {
    /// A tool-less request with default settings.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            settings: GenerationSettings::default(),
            tools: None,
        }
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub finish_reason: Option<FinishReason>,
}

/// The inference capability: given messages and tools, produce a response.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate text (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, CounselError>;

    /// Generate text (streaming).
    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, CounselError>>, CounselError>;
}

/// Create the configured provider.
#[allow(unused_variables)]
pub fn create_provider(config: &CounselConfig) -> Result<Arc<dyn ModelProvider>, CounselError> {
    #[cfg(feature = "openai")]
    {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| CounselError::Authentication("Missing OPENAI_API_KEY".into()))?;
        Ok(Arc::new(openai::OpenAiProvider::new(
            config.model.clone(),
            api_key,
            config.openai_base_url.clone(),
        )))
    }
    #[cfg(not(feature = "openai"))]
    {
        Err(CounselError::Configuration(
            "no inference provider enabled via feature flags".into(),
        ))
    }
}
