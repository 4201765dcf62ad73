//! Agent system - a model session with tools

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::agent::message::{Message, Role, ToolCall};
use crate::agent::provider::{ChatRequest, Provider};
use crate::agent::streaming::{AssistantTurn, StreamingResponse};
use crate::config::{AgentLimits, ModelConfig};
use crate::error::{Error, Result};
use crate::tool::{Tool, ToolDefinition, ToolSet};

/// Configuration for an Agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name of the agent (for logging/identity)
    pub name: String,
    /// Model to use (provider specific string)
    pub model: String,
    /// System prompt / Preamble
    pub preamble: String,
    /// Temperature for generation
    pub temperature: Option<f64>,
    /// Max tokens to generate
    pub max_tokens: Option<u64>,
    /// Additional provider-specific parameters
    pub extra_params: Option<serde_json::Value>,
    /// Max model round-trips for a single prompt
    pub max_steps: usize,
    /// Max characters allowed in tool output before truncation
    pub max_tool_output_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let model = ModelConfig::default();
        let limits = AgentLimits::default();
        Self {
            name: "agent".to_string(),
            model: model.model,
            preamble: "You are a helpful AI assistant.".to_string(),
            temperature: Some(model.temperature),
            max_tokens: Some(model.max_tokens),
            extra_params: None,
            max_steps: limits.max_steps,
            max_tool_output_chars: limits.max_tool_output_chars,
        }
    }
}

impl AgentConfig {
    /// Config seeded from the model and limit sections of [`crate::config::NexusConfig`]
    pub fn from_settings(name: impl Into<String>, model: &ModelConfig, limits: &AgentLimits) -> Self {
        Self {
            name: name.into(),
            model: model.model.clone(),
            temperature: Some(model.temperature),
            max_tokens: Some(model.max_tokens),
            max_steps: limits.max_steps,
            max_tool_output_chars: limits.max_tool_output_chars,
            ..Self::default()
        }
    }
}

/// Events emitted by the Agent during execution
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Agent started thinking (prompt received)
    Thinking {
        /// Agent name
        agent: String,
        /// Prompt text
        prompt: String,
    },
    /// Agent decided to use a tool
    ToolCall {
        /// Tool name
        tool: String,
        /// Raw JSON arguments
        input: String,
    },
    /// Tool execution finished
    ToolResult {
        /// Tool name
        tool: String,
        /// Tool output as sent back to the model
        output: String,
    },
    /// Agent generated a final response
    Response {
        /// Final text
        content: String,
    },
    /// Error occurred
    Error {
        /// Error message
        message: String,
    },
}

/// The main Agent struct
pub struct Agent<P: Provider> {
    provider: Arc<P>,
    tools: ToolSet,
    config: AgentConfig,
    events: broadcast::Sender<AgentEvent>,
}

impl<P: Provider> Agent<P> {
    /// Create a new agent builder
    pub fn builder(provider: P) -> AgentBuilder<P> {
        AgentBuilder::new(provider)
    }

    /// Subscribe to agent events
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AgentEvent) {
        if let Err(e) = self.events.send(event) {
            tracing::debug!("Failed to emit event (no receivers): {}", e);
        }
    }

    /// Send a prompt and get a response (non-streaming)
    #[instrument(skip(self, prompt), fields(agent = %self.config.name, model = %self.config.model))]
    pub async fn prompt(&self, prompt: impl Into<String>) -> Result<String> {
        self.chat(vec![Message::user(prompt.into())]).await
    }

    /// Run the tool loop over `messages` until the model answers without tool calls
    #[instrument(skip(self, messages), fields(agent = %self.config.name, message_count = messages.len()))]
    pub async fn chat(&self, mut messages: Vec<Message>) -> Result<String> {
        if let Some(last) = messages.last() {
            if last.role == Role::User {
                self.emit(AgentEvent::Thinking {
                    agent: self.config.name.clone(),
                    prompt: last.text(),
                });
            }
        }

        for step in 1..=self.config.max_steps {
            info!("Agent {} starting chat completion (step {})", self.config.name, step);

            let turn: AssistantTurn = self
                .stream_chat(messages.clone())
                .await?
                .collect_turn()
                .await?;

            if turn.is_final() {
                self.emit(AgentEvent::Response {
                    content: turn.text.clone(),
                });
                return Ok(turn.text);
            }

            messages.push(Message::assistant_tool_calls(&turn.text, &turn.tool_calls));

            // Nested model calls run one after another
            for call in &turn.tool_calls {
                let output = self.run_tool_call(call).await;
                messages.push(Message::tool_result(&call.id, &call.name, output));
            }
        }

        self.emit(AgentEvent::Error {
            message: "Max agent steps exceeded".to_string(),
        });
        Err(Error::AgentExecution(format!(
            "Max agent steps exceeded ({})",
            self.config.max_steps
        )))
    }

    /// Execute one model-issued call; failures are reported back to the model as text
    async fn run_tool_call(&self, call: &ToolCall) -> String {
        let arguments = call.arguments.to_string();
        match self.call_tool(&call.name, &arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                format!("Error: {}", e)
            }
        }
    }

    /// Stream a chat response
    pub async fn stream_chat(&self, messages: Vec<Message>) -> Result<StreamingResponse> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            system_prompt: Some(self.config.preamble.clone()),
            messages,
            tools: self.tools.definitions().await,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            extra_params: self.config.extra_params.clone(),
        };

        self.provider.stream_completion(request).await
    }

    /// Call a tool by name (Direct call helper)
    #[instrument(skip(self, arguments), fields(tool_name = %name))]
    pub async fn call_tool(&self, name: &str, arguments: &str) -> Result<String> {
        self.emit(AgentEvent::ToolCall {
            tool: name.to_string(),
            input: arguments.to_string(),
        });

        match self.tools.call(name, arguments).await {
            Ok(output) => {
                let output = truncate_output(output, self.config.max_tool_output_chars);
                self.emit(AgentEvent::ToolResult {
                    tool: name.to_string(),
                    output: output.clone(),
                });
                Ok(output)
            }
            Err(e) => {
                self.emit(AgentEvent::Error {
                    message: e.to_string(),
                });
                Err(Error::tool_execution(name, e.to_string()))
            }
        }
    }

    /// Check if agent has a tool
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains(name)
    }

    /// Definitions of every tool this agent can call
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions().await
    }

    /// Get the agent's configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Keep the first `limit` chars of `output` and say so
fn truncate_output(mut output: String, limit: usize) -> String {
    let Some((cut, _)) = output.char_indices().nth(limit) else {
        return output;
    };
    let original_chars = limit + output[cut..].chars().count();
    output.truncate(cut);
    output.push_str(&format!(
        "\n\n(Note: Output truncated from {} to {} chars to save tokens)",
        original_chars, limit
    ));
    output
}

/// Builder for creating agents
pub struct AgentBuilder<P: Provider> {
    provider: P,
    tools: ToolSet,
    config: AgentConfig,
}

impl<P: Provider> AgentBuilder<P> {
    /// Create a new builder with a provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            tools: ToolSet::new(),
            config: AgentConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the agent name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the model to use
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.preamble = prompt.into();
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temp: f64) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, tokens: u64) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Add extra provider-specific parameters
    pub fn extra_params(mut self, params: serde_json::Value) -> Self {
        self.config.extra_params = Some(params);
        self
    }

    /// Set max model round-trips per prompt
    pub fn max_steps(mut self, steps: usize) -> Self {
        self.config.max_steps = steps;
        self
    }

    /// Set max tool output characters
    pub fn max_tool_output_chars(mut self, count: usize) -> Self {
        self.config.max_tool_output_chars = count;
        self
    }

    /// Add a tool
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.add(tool);
        self
    }

    /// Add a shared tool
    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.add_shared(tool);
        self
    }

    /// Add multiple tools from a toolset
    pub fn tools(mut self, tools: &ToolSet) -> Self {
        for (_, tool) in tools.iter() {
            self.tools.add_shared(Arc::clone(tool));
        }
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<Agent<P>> {
        if self.config.model.is_empty() {
            return Err(Error::agent_config("model name cannot be empty"));
        }
        if self.config.max_steps == 0 {
            return Err(Error::agent_config("max_steps must be at least 1"));
        }

        let (tx, _) = broadcast::channel(256);

        Ok(Agent {
            provider: Arc::new(self.provider),
            tools: self.tools,
            config: self.config,
            events: tx,
        })
    }
}
