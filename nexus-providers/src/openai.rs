//! OpenAI provider implementation
//!
//! Also compatible with OpenAI-style APIs such as Moonshot.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::utils::SseDecoder;
use crate::{
    ChatRequest, Error, HttpConfig, Message, Provider, Result, StreamingChoice, StreamingResponse,
    ToolDefinition,
};
use nexus_core::agent::message::{Content, ContentPart, ToolCall};
use nexus_core::config::RemoteEmbeddingConfig;
use nexus_core::rag::Embeddings;

/// Default embedding model
pub const TEXT_EMBEDDING_3_SMALL: &str = "text-embedding-3-small";

/// OpenAI API client
pub struct OpenAI {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    embedding_model: String,
    embedding_dimension: usize,
    request_dimensions: bool,
}

impl OpenAI {
    /// Create from API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, "https://api.openai.com/v1")
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::ProviderAuth("OPENAI_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }

    /// Create with custom base URL (for compatible APIs)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_http_config(api_key, base_url, &HttpConfig::default())
    }

    /// Create with custom base URL and HTTP settings
    pub fn with_http_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        http: &HttpConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: http.build_client()?,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            embedding_model: TEXT_EMBEDDING_3_SMALL.to_string(),
            embedding_dimension: 1536,
            request_dimensions: false,
        })
    }

    /// Embedding client for the configured endpoint, asking for `dimension` outputs
    pub fn embeddings_from_config(
        api_key: impl Into<String>,
        config: &RemoteEmbeddingConfig,
        dimension: usize,
    ) -> Result<Self> {
        let client = Self::with_http_config(
            api_key,
            &config.base_url,
            &HttpConfig::with_timeout(config.timeout_secs),
        )?;
        Ok(client
            .with_embedding_model(&config.model, dimension)
            .with_embedding_dimensions(dimension))
    }

    /// Use a different embedding model of the given output size
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimension = dimension;
        self
    }

    /// Ask the endpoint to shorten vectors to `dimension` (text-embedding-3 models)
    pub fn with_embedding_dimensions(mut self, dimension: usize) -> Self {
        self.embedding_dimension = dimension;
        self.request_dimensions = true;
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Internal(e.to_string()))?,
        );
        Ok(headers)
    }

    /// Map a non-success response to the matching provider error
    async fn error_for(response: reqwest::Response, context: &str) -> Error {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::ProviderAuth(format!("{} {}: {}", context, status, body))
            }
            StatusCode::TOO_MANY_REQUESTS => Error::ProviderRateLimit { retry_after_secs },
            _ => Error::ProviderApi(format!("{} {}: {}", context, status, body)),
        }
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct CompletionBody {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAITool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIToolFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Streaming chunk from OpenAI
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    index: Option<usize>,
    id: Option<String>,
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

impl OpenAI {
    fn convert_messages(system_prompt: Option<&str>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);

        if let Some(prompt) = system_prompt {
            result.push(OpenAIMessage {
                role: "system",
                content: serde_json::Value::String(prompt.to_string()),
                name: None,
                tool_call_id: None,
                tool_calls: None,
            });
        }

        for msg in messages {
            let mut tool_calls = Vec::new();
            let mut tool_call_id = None;
            let mut text = String::new();

            match msg.content {
                Content::Text(t) => text = t,
                Content::Parts(parts) => {
                    for part in parts {
                        match part {
                            ContentPart::Text { text: t } => text.push_str(&t),
                            ContentPart::ToolCall {
                                id,
                                name,
                                arguments,
                            } => tool_calls.push(OpenAIToolCall {
                                id,
                                call_type: "function".to_string(),
                                function: OpenAIFunction {
                                    name,
                                    arguments: arguments.to_string(),
                                },
                            }),
                            ContentPart::ToolResult {
                                tool_call_id: id,
                                content,
                                ..
                            } => {
                                tool_call_id = Some(id);
                                text = content;
                            }
                        }
                    }
                }
            }

            // Assistant turns that only carry tool calls send null content
            let content = if text.is_empty() && !tool_calls.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::String(text)
            };

            result.push(OpenAIMessage {
                role: msg.role.as_str(),
                content,
                name: msg.name,
                tool_call_id,
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            });
        }

        result
    }

    fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<OpenAITool> {
        tools
            .into_iter()
            .map(|t| OpenAITool {
                tool_type: "function",
                function: OpenAIToolFunction {
                    name: t.name,
                    description: t.description,
                    parameters: t.parameters,
                },
            })
            .collect()
    }

    fn build_body(request: ChatRequest) -> CompletionBody {
        let response_format = request
            .extra_params
            .as_ref()
            .and_then(|p| p.get("response_format"))
            .cloned();

        CompletionBody {
            model: request.model,
            messages: Self::convert_messages(request.system_prompt.as_deref(), request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: Self::convert_tools(request.tools),
            response_format,
            stream: true,
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        let body = Self::build_body(request);
        tracing::debug!(model = %body.model, messages = body.messages.len(), tools = body.tools.len(), "sending chat completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, "Chat API error").await);
        }

        Ok(StreamingResponse::from_stream(parse_sse_stream(
            response.bytes_stream(),
        )))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Tool call fragments accumulated across chunks
#[derive(Default)]
struct ToolCallState {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

#[derive(Default)]
struct SseState {
    decoder: SseDecoder,
    pending: VecDeque<StreamingChoice>,
    tools: BTreeMap<usize, ToolCallState>,
    finished: bool,
}

impl SseState {
    /// Turn accumulated fragments into one ParallelToolCalls event
    fn flush_tools(&mut self) {
        if self.tools.is_empty() {
            return;
        }
        let calls: BTreeMap<usize, ToolCall> = std::mem::take(&mut self.tools)
            .into_iter()
            .filter_map(|(index, state)| {
                let (id, name) = (state.id?, state.name?);
                let arguments = if state.arguments.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&state.arguments).unwrap_or_else(|e| {
                        tracing::warn!("Tool call {} sent invalid JSON arguments: {}", name, e);
                        serde_json::Value::String(state.arguments.clone())
                    })
                };
                Some((index, ToolCall::new(id, name, arguments)))
            })
            .collect();
        if !calls.is_empty() {
            self.pending.push_back(StreamingChoice::ParallelToolCalls(calls));
        }
    }

    fn handle_payload(&mut self, data: &str) {
        if data.trim() == "[DONE]" {
            self.flush_tools();
            self.pending.push_back(StreamingChoice::Done);
            self.finished = true;
            return;
        }

        let chunk = match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("Failed to parse SSE chunk: {}", e);
                return;
            }
        };

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                self.pending.push_back(StreamingChoice::Message(content));
            }

            for tc in choice.delta.tool_calls.unwrap_or_default() {
                let state = self.tools.entry(tc.index.unwrap_or(0)).or_default();
                if let Some(id) = tc.id {
                    state.id = Some(id);
                }
                if let Some(func) = tc.function {
                    if let Some(name) = func.name {
                        state.name = Some(name);
                    }
                    if let Some(args) = func.arguments {
                        state.arguments.push_str(&args);
                    }
                }
            }

            if choice.finish_reason.is_some() {
                self.flush_tools();
            }
        }
    }
}

/// Parse Server-Sent Events stream from an OpenAI-compatible endpoint
fn parse_sse_stream<S>(stream: S) -> impl Stream<Item = Result<StreamingChoice>>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    futures::stream::unfold(
        (stream, SseState::default()),
        |(mut stream, mut state)| async move {
            loop {
                if let Some(choice) = state.pending.pop_front() {
                    return Some((Ok(choice), (stream, state)));
                }
                if state.finished {
                    return None;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => match state.decoder.push(&bytes) {
                        Ok(payloads) => {
                            for data in payloads {
                                state.handle_payload(&data);
                            }
                        }
                        Err(e) => {
                            state.finished = true;
                            return Some((Err(e), (stream, state)));
                        }
                    },
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((Err(Error::Http(e)), (stream, state)));
                    }
                    None => {
                        // Connection closed without [DONE]
                        state.flush_tools();
                        state.finished = true;
                        if state.pending.is_empty() {
                            return None;
                        }
                    }
                }
            }
        },
    )
}

// --- Embeddings Implementation ---

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embeddings for OpenAI {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_many(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Embedding("cannot embed empty text".to_string()));
        }

        let request = EmbeddingRequest {
            input: texts,
            model: &self.embedding_model,
            dimensions: self.request_dimensions.then_some(self.embedding_dimension),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, "Embeddings API error").await);
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        if body.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }
        body.data.sort_by_key(|d| d.index);
        if let Some(bad) = body
            .data
            .iter()
            .find(|d| d.embedding.len() != self.embedding_dimension)
        {
            return Err(Error::DimensionMismatch {
                expected: self.embedding_dimension,
                actual: bad.embedding.len(),
            });
        }
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }
}
