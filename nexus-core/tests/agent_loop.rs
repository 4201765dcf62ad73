//! Agent tool loop driven by a scripted provider

mod common;

use async_trait::async_trait;
use common::{call, scripted, text};
use nexus_core::agent::message::Role;
use nexus_core::prelude::*;
use nexus_core::tool::parse_arguments;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

struct Upper;

#[derive(Deserialize, JsonSchema)]
struct UpperArgs {
    /// Text to upper-case
    text: String,
}

#[async_trait]
impl Tool for Upper {
    fn name(&self) -> String {
        "upper".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<UpperArgs>("upper", "Upper-case some text")
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: UpperArgs = parse_arguments("upper", arguments)?;
        Ok(args.text.to_uppercase())
    }
}

#[tokio::test]
async fn test_tool_result_is_fed_back() {
    let provider = scripted(vec![
        call("c1", "upper", json!({"text": "jfk"})),
        text("Departing from JFK."),
    ]);
    let agent = Agent::builder(provider.clone())
        .system_prompt("be brief")
        .tool(Upper)
        .build()
        .expect("agent builds");

    let answer = agent.prompt("where from?").await.expect("prompt succeeds");
    assert_eq!(answer, "Departing from JFK.");

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].system_prompt.as_deref(), Some("be brief"));
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "upper");

    let followup = &requests[1].messages;
    assert_eq!(followup.len(), 3);
    assert_eq!(followup[1].role, Role::Assistant);
    assert_eq!(followup[1].tool_calls()[0].name, "upper");
    assert_eq!(followup[2].role, Role::Tool);
    assert_eq!(followup[2].text(), "JFK");
}

#[tokio::test]
async fn test_tool_failure_becomes_error_text() {
    let provider = scripted(vec![
        call("c1", "missing", json!({})),
        text("Sorry, that did not work."),
    ]);
    let agent = Agent::builder(provider.clone()).build().expect("agent builds");

    let answer = agent.prompt("do it").await.expect("prompt succeeds");
    assert_eq!(answer, "Sorry, that did not work.");

    let result = provider.requests()[1].messages[2].text();
    assert!(result.starts_with("Error: "), "{result}");
    assert!(result.contains("Tool not found: missing"));
}

#[tokio::test]
async fn test_step_limit_is_enforced() {
    let provider = scripted(vec![
        call("c1", "upper", json!({"text": "a"})),
        call("c2", "upper", json!({"text": "b"})),
        call("c3", "upper", json!({"text": "c"})),
    ]);
    let agent = Agent::builder(provider.clone())
        .tool(Upper)
        .max_steps(2)
        .build()
        .expect("agent builds");

    let err = agent.prompt("loop").await.unwrap_err();
    assert!(matches!(err, Error::AgentExecution(_)));
    assert_eq!(provider.remaining(), 1);
}

#[tokio::test]
async fn test_long_tool_output_is_truncated() {
    let provider = scripted(vec![
        call("c1", "upper", json!({"text": "x".repeat(100)})),
        text("done"),
    ]);
    let agent = Agent::builder(provider.clone())
        .tool(Upper)
        .max_tool_output_chars(10)
        .build()
        .expect("agent builds");

    agent.prompt("shout").await.expect("prompt succeeds");
    let result = provider.requests()[1].messages[2].text();
    assert!(result.starts_with("XXXXXXXXXX\n\n(Note: Output truncated from 100 to 10 chars"));
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let provider = scripted(vec![MockTurn::Error("401".into())]);
    let agent = Agent::builder(provider).build().expect("agent builds");
    assert!(matches!(
        agent.prompt("hi").await,
        Err(Error::ProviderApi(_))
    ));
}

#[tokio::test]
async fn test_events_are_broadcast() {
    let provider = scripted(vec![
        call("c1", "upper", json!({"text": "ok"})),
        text("OK"),
    ]);
    let agent = Agent::builder(provider).tool(Upper).build().expect("agent builds");
    let mut events = agent.subscribe();

    agent.prompt("go").await.expect("prompt succeeds");

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(match event {
            AgentEvent::Thinking { .. } => "thinking",
            AgentEvent::ToolCall { .. } => "tool_call",
            AgentEvent::ToolResult { .. } => "tool_result",
            AgentEvent::Response { .. } => "response",
            AgentEvent::Error { .. } => "error",
        });
    }
    assert_eq!(kinds, vec!["thinking", "tool_call", "tool_result", "response"]);
}

#[test]
fn test_builder_rejects_zero_steps() {
    let provider = scripted(Vec::new());
    assert!(Agent::builder(provider).max_steps(0).build().is_err());
}
