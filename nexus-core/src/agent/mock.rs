//! Mock provider for testing

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::agent::provider::{ChatRequest, Provider};
use crate::agent::streaming::{MockStreamBuilder, StreamingResponse};
use crate::error::{Error, Result};

/// One scripted completion
#[derive(Debug, Clone)]
pub enum MockTurn {
    /// Plain text answer
    Text(String),
    /// Tool calls as (id, name, arguments)
    ToolCalls(Vec<(String, String, serde_json::Value)>),
    /// Provider failure
    Error(String),
}

/// A mock provider for testing
///
/// Scripted turns are consumed in order. Once they run out the fallback
/// response is returned, or an error when there is none.
pub struct MockProvider {
    fallback: Option<String>,
    script: Mutex<VecDeque<MockTurn>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with predefined response
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replay `turns` and fail every request after the last one
    pub fn scripted(turns: Vec<MockTurn>) -> Self {
        Self {
            fallback: None,
            script: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a turn
    pub fn then(self, turn: MockTurn) -> Self {
        self.script.lock().push_back(turn);
        self
    }

    /// Queue a tool call turn
    pub fn then_tool_call(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        self.then(MockTurn::ToolCalls(vec![(id.into(), name.into(), arguments)]))
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Scripted turns not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    fn text_stream(text: &str) -> StreamingResponse {
        // Split response into chunks for realistic streaming simulation
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(10)
            .fold(MockStreamBuilder::new(), |builder, c| {
                builder.message(c.iter().collect::<String>())
            })
            .done()
            .build()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        self.requests.lock().push(request);
        let next = self.script.lock().pop_front();

        match next {
            None => match &self.fallback {
                Some(text) => Ok(Self::text_stream(text)),
                None => Err(Error::ProviderApi("mock script exhausted".to_string())),
            },
            Some(MockTurn::Text(text)) => Ok(Self::text_stream(&text)),
            Some(MockTurn::ToolCalls(calls)) => Ok(calls
                .into_iter()
                .fold(MockStreamBuilder::new(), |builder, (id, name, args)| {
                    builder.tool_call(id, name, args)
                })
                .done()
                .build()),
            Some(MockTurn::Error(message)) => Err(Error::ProviderApi(message)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::Message;

    fn request(text: &str) -> ChatRequest {
        ChatRequest {
            model: "test".into(),
            system_prompt: None,
            messages: vec![Message::user(text)],
            tools: vec![],
            temperature: None,
            max_tokens: None,
            extra_params: None,
        }
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockProvider::new("Hello, world! This is long enough to chunk.");
        let stream = provider
            .stream_completion(request("Hi"))
            .await
            .expect("should succeed");

        let text = stream.collect_text().await.expect("collect should succeed");
        assert_eq!(text, "Hello, world! This is long enough to chunk.");
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_script_runs_before_fallback() {
        let provider = MockProvider::new("fallback")
            .then_tool_call("c1", "policy_agent", serde_json::json!({"query": "bags"}))
            .then(MockTurn::Error("boom".into()));

        let turn = provider
            .stream_completion(request("a"))
            .await
            .expect("tool turn")
            .collect_turn()
            .await
            .expect("collects");
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].name, "policy_agent");

        assert!(provider.stream_completion(request("b")).await.is_err());

        let text = provider
            .stream_completion(request("c"))
            .await
            .expect("fallback")
            .collect_text()
            .await
            .expect("collects");
        assert_eq!(text, "fallback");
    }

    #[tokio::test]
    async fn test_scripted_fails_once_exhausted() {
        let provider = MockProvider::scripted(vec![MockTurn::Text("only".into())]);
        assert_eq!(provider.remaining(), 1);

        assert!(provider.stream_completion(request("a")).await.is_ok());
        assert_eq!(provider.remaining(), 0);
        assert!(matches!(
            provider.stream_completion(request("b")).await,
            Err(Error::ProviderApi(_))
        ));
    }
}
