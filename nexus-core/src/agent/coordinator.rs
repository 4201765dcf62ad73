//! Multi-agent coordination
//!
//! The coordinator is one agent session whose tools are the responders.
//! Which responder runs, and how often, is the model's call; [`Coordinator::dispatch`]
//! bypasses the model for callers that already know the capability they want.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::agent::core::{Agent, AgentConfig, AgentEvent};
use crate::agent::provider::SharedProvider;
use crate::error::{Error, Result};
use crate::prompts::COORDINATOR_SYSTEM_PROMPT;
use crate::tool::{parse_arguments, Tool, ToolDefinition};

/// The capability set the coordinator can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderKind {
    /// Flight search, booking, status, cancellation
    Flight,
    /// Policy questions answered from retrieved documents
    Policy,
    /// Complaints and issues that may need a ticket
    Support,
    /// Everything else
    General,
}

impl ResponderKind {
    /// Every kind, in registration order
    pub const ALL: [ResponderKind; 4] = [Self::Flight, Self::Policy, Self::Support, Self::General];

    /// Name of the tool the coordinator model sees
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Flight => "flight_agent",
            Self::Policy => "policy_agent",
            Self::Support => "support_agent",
            Self::General => "general_agent",
        }
    }

    /// Domain wording used in error replies
    pub fn domain(&self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Policy => "policy related",
            Self::Support => "support related",
            Self::General => "general",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Flight => "Process and respond to Flight related queries.",
            Self::Policy => "Process and respond to Policy related queries.",
            Self::Support => "Process and respond to Support related queries. It will analyze the complexity of the query and decide whether to create a support ticket or provide a general response.",
            Self::General => "Process and respond to general queries.",
        }
    }

    /// Parse a tool name back into a kind
    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tool_name() == name)
    }
}

impl fmt::Display for ResponderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// A specialized query handler bound to one domain
#[async_trait]
pub trait Responder: Send + Sync {
    /// Domain this responder serves
    fn kind(&self) -> ResponderKind;

    /// Answer `query`, surfacing failures
    async fn respond(&self, query: &str) -> Result<String>;

    /// Answer `query`; failures become a customer-facing error line
    async fn handle(&self, query: &str) -> String {
        match self.respond(query).await {
            Ok(text) => text,
            Err(e) => {
                warn!(responder = %self.kind(), "responder failed: {}", e);
                format!("Error processing your {} query: {}", self.kind().domain(), e)
            }
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct QueryArgs {
    /// The user's question or request, restated for this agent
    query: String,
}

/// Exposes a responder to the coordinator model as a `{query}` tool
pub struct ResponderTool {
    responder: Arc<dyn Responder>,
}

impl ResponderTool {
    /// Wrap a responder
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self { responder }
    }
}

#[async_trait]
impl Tool for ResponderTool {
    fn name(&self) -> String {
        self.responder.kind().tool_name().to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        let kind = self.responder.kind();
        ToolDefinition::for_args::<QueryArgs>(kind.tool_name(), kind.description())
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: QueryArgs = parse_arguments(&self.name(), arguments)?;
        Ok(self.responder.handle(&args.query).await)
    }
}

/// Routes user text to responders through a model session
pub struct Coordinator {
    agent: Agent<SharedProvider>,
    responders: DashMap<ResponderKind, Arc<dyn Responder>>,
}

impl Coordinator {
    /// Start building a coordinator on `provider`
    pub fn builder(provider: SharedProvider) -> CoordinatorBuilder {
        CoordinatorBuilder::new(provider)
    }

    /// Let the model route `input` and return its final answer
    pub async fn ask(&self, input: &str) -> Result<String> {
        info!(chars = input.len(), "coordinator received query");
        self.agent.prompt(input).await
    }

    /// Run one responder directly, skipping model routing
    pub async fn dispatch(&self, kind: ResponderKind, query: &str) -> Result<String> {
        let responder = self
            .responders
            .get(&kind)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| Error::agent_config(format!("No responder registered for {}", kind)))?;
        Ok(responder.handle(query).await)
    }

    /// Kinds that have a responder
    pub fn kinds(&self) -> Vec<ResponderKind> {
        ResponderKind::ALL
            .into_iter()
            .filter(|k| self.responders.contains_key(k))
            .collect()
    }

    /// Subscribe to the routing agent's events
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.agent.subscribe()
    }
}

/// Builder for [`Coordinator`]
pub struct CoordinatorBuilder {
    provider: SharedProvider,
    config: AgentConfig,
    responders: Vec<Arc<dyn Responder>>,
}

impl CoordinatorBuilder {
    fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            config: AgentConfig {
                name: "coordinator".to_string(),
                ..AgentConfig::default()
            },
            responders: Vec::new(),
        }
    }

    /// Model settings for the routing session; the preamble is replaced
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a responder; a later one of the same kind wins
    pub fn responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responders.push(responder);
        self
    }

    /// Build the coordinator
    pub fn build(self) -> Result<Coordinator> {
        if self.responders.is_empty() {
            return Err(Error::agent_config("coordinator needs at least one responder"));
        }

        let responders = DashMap::new();
        let mut builder = Agent::builder(self.provider)
            .config(self.config)
            .system_prompt(COORDINATOR_SYSTEM_PROMPT);
        for responder in self.responders {
            builder = builder.tool(ResponderTool::new(Arc::clone(&responder)));
            responders.insert(responder.kind(), responder);
        }

        Ok(Coordinator {
            agent: builder.build()?,
            responders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Responder for Failing {
        fn kind(&self) -> ResponderKind {
            ResponderKind::Support
        }

        async fn respond(&self, _query: &str) -> Result<String> {
            Err(Error::ProviderApi("503 upstream".into()))
        }
    }

    #[test]
    fn test_tool_names_round_trip() {
        for kind in ResponderKind::ALL {
            assert_eq!(ResponderKind::from_tool_name(kind.tool_name()), Some(kind));
        }
        assert_eq!(ResponderKind::from_tool_name("booking_agent"), None);
    }

    #[tokio::test]
    async fn test_handle_stringifies_errors() {
        let text = Failing.handle("refund please").await;
        assert_eq!(
            text,
            "Error processing your support related query: Provider API error: 503 upstream"
        );
    }

    #[tokio::test]
    async fn test_responder_tool_schema() {
        let tool = ResponderTool::new(Arc::new(Failing));
        let def = tool.definition().await;
        assert_eq!(def.name, "support_agent");
        assert_eq!(def.parameters["required"][0], "query");
    }
}
