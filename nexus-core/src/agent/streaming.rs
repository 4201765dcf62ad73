//! Streaming response types

use std::collections::BTreeMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};

use crate::agent::message::ToolCall;
use crate::error::Error;

/// A chunk from a streaming response
#[derive(Debug, Clone)]
pub enum StreamingChoice {
    /// Text content chunk
    Message(String),

    /// Single tool call
    ToolCall {
        /// Tool call ID
        id: String,
        /// Tool name
        name: String,
        /// Arguments as JSON
        arguments: serde_json::Value,
    },

    /// Several tool calls finished in the same chunk, keyed by their stream index
    ParallelToolCalls(BTreeMap<usize, ToolCall>),

    /// Stream finished
    Done,
}

impl StreamingChoice {
    /// Check if this is a message chunk
    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    /// Check if this is a tool call
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall { .. } | Self::ParallelToolCalls(_))
    }

    /// Check if stream is done
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Everything the model produced in one completion
#[derive(Debug, Clone, Default)]
pub struct AssistantTurn {
    /// Concatenated text chunks
    pub text: String,
    /// Tool calls in the order the model issued them
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantTurn {
    /// True when the model answered without asking for tools
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Type alias for streaming result
pub type StreamingResult = Pin<Box<dyn Stream<Item = Result<StreamingChoice, Error>> + Send>>;

/// A wrapper for streaming responses with utility methods
pub struct StreamingResponse {
    inner: StreamingResult,
}

impl StreamingResponse {
    /// Create from a stream
    pub fn new(stream: StreamingResult) -> Self {
        Self { inner: stream }
    }

    /// Create from any stream that implements the right traits
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamingChoice, Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Collect all message chunks into a single string, ignoring tool calls
    pub async fn collect_text(self) -> Result<String, Error> {
        Ok(self.collect_turn().await?.text)
    }

    /// Drain the stream into text plus tool calls
    pub async fn collect_turn(mut self) -> Result<AssistantTurn, Error> {
        let mut turn = AssistantTurn::default();
        while let Some(chunk) = self.inner.next().await {
            match chunk? {
                StreamingChoice::Message(text) => turn.text.push_str(&text),
                StreamingChoice::ToolCall {
                    id,
                    name,
                    arguments,
                } => turn.tool_calls.push(ToolCall::new(id, name, arguments)),
                StreamingChoice::ParallelToolCalls(calls) => {
                    turn.tool_calls.extend(calls.into_values());
                }
                StreamingChoice::Done => break,
            }
        }
        Ok(turn)
    }

    /// Get the inner stream
    pub fn into_inner(self) -> StreamingResult {
        self.inner
    }
}

impl Stream for StreamingResponse {
    type Item = Result<StreamingChoice, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Builder for creating mock streams (useful for testing)
pub struct MockStreamBuilder {
    chunks: Vec<Result<StreamingChoice, Error>>,
}

impl Default for MockStreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStreamBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Add a message chunk
    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.chunks.push(Ok(StreamingChoice::Message(text.into())));
        self
    }

    /// Add a tool call
    pub fn tool_call(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        self.chunks.push(Ok(StreamingChoice::ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }));
        self
    }

    /// Add done marker
    pub fn done(mut self) -> Self {
        self.chunks.push(Ok(StreamingChoice::Done));
        self
    }

    /// Add an error
    pub fn error(mut self, error: Error) -> Self {
        self.chunks.push(Err(error));
        self
    }

    /// Build the stream
    pub fn build(self) -> StreamingResponse {
        StreamingResponse::from_stream(futures::stream::iter(self.chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_text() {
        let stream = MockStreamBuilder::new()
            .message("Your flight ")
            .message("is on time.")
            .done()
            .build();

        let text = stream.collect_text().await.expect("collect should succeed");
        assert_eq!(text, "Your flight is on time.");
    }

    #[tokio::test]
    async fn test_collect_turn_keeps_tool_call_order() {
        let mut parallel = BTreeMap::new();
        parallel.insert(1, ToolCall::new("c3", "general_agent", serde_json::json!({})));
        parallel.insert(0, ToolCall::new("c2", "policy_agent", serde_json::json!({})));

        let stream = StreamingResponse::from_stream(futures::stream::iter(vec![
            Ok(StreamingChoice::Message("Checking".into())),
            Ok(StreamingChoice::ToolCall {
                id: "c1".into(),
                name: "flight_agent".into(),
                arguments: serde_json::json!({"query": "JFK"}),
            }),
            Ok(StreamingChoice::ParallelToolCalls(parallel)),
            Ok(StreamingChoice::Done),
        ]));

        let turn = stream.collect_turn().await.expect("collect should succeed");
        assert_eq!(turn.text, "Checking");
        let names: Vec<_> = turn.tool_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["flight_agent", "policy_agent", "general_agent"]);
        assert!(!turn.is_final());
    }

    #[tokio::test]
    async fn test_error_chunk_aborts_collection() {
        let stream = MockStreamBuilder::new()
            .message("partial")
            .error(Error::StreamInterrupted("connection reset".into()))
            .build();

        assert!(stream.collect_turn().await.is_err());
    }

    #[tokio::test]
    async fn test_stream_iteration() {
        let mut stream = MockStreamBuilder::new()
            .message("chunk1")
            .message("chunk2")
            .done()
            .build();

        let mut messages = Vec::new();
        while let Some(chunk) = stream.next().await {
            if let Ok(StreamingChoice::Message(text)) = chunk {
                messages.push(text);
            }
        }

        assert_eq!(messages, vec!["chunk1", "chunk2"]);
    }
}
