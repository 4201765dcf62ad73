//! Provider trait for LLM integrations

use async_trait::async_trait;

use crate::agent::message::Message;
use crate::agent::streaming::StreamingResponse;
use crate::error::Result;
use crate::tool::ToolDefinition;

/// Provider handle shared between the coordinator and nested responder agents
pub type SharedProvider = std::sync::Arc<dyn Provider>;

/// Request for a chat completion
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Model name to use
    pub model: String,
    /// Optional system prompt
    pub system_prompt: Option<String>,
    /// Conversation history
    pub messages: Vec<Message>,
    /// Available tools
    pub tools: Vec<ToolDefinition>,
    /// Optional temperature setting
    pub temperature: Option<f64>,
    /// Optional max tokens
    pub max_tokens: Option<u64>,
    /// Optional provider-specific parameters
    pub extra_params: Option<serde_json::Value>,
}

/// Trait for LLM providers
///
/// Implement this trait to add support for a new LLM provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stream a completion request
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse>;

    /// Get provider name (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Check if provider supports tool calls
    fn supports_tools(&self) -> bool {
        true
    }
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for std::sync::Arc<P> {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        (**self).stream_completion(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn supports_tools(&self) -> bool {
        (**self).supports_tools()
    }
}
