//! Error types for the nexus assistant

use thiserror::Error;

/// Result type alias using nexus's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the nexus assistant
#[derive(Debug, Error)]
pub enum Error {
    // ============ Agent Errors ============
    /// Agent is not properly configured
    #[error("Agent configuration error: {0}")]
    AgentConfig(String),

    /// Agent execution failed
    #[error("Agent execution error: {0}")]
    AgentExecution(String),

    // ============ Provider Errors ============
    /// Provider API error
    #[error("Provider API error: {0}")]
    ProviderApi(String),

    /// Provider authentication failed
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider rate limit exceeded
    #[error("Provider rate limit exceeded: retry after {retry_after_secs}s")]
    ProviderRateLimit {
        /// Seconds to wait before retrying
        retry_after_secs: u64,
    },

    // ============ Tool Errors ============
    /// Tool not found in agent's toolset
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution failed
    #[error("Tool execution error: {tool_name} - {message}")]
    ToolExecution {
        /// Name of the tool that failed
        tool_name: String,
        /// Error message
        message: String,
    },

    /// Invalid tool arguments
    #[error("Invalid tool arguments for {tool_name}: {message}")]
    ToolArguments {
        /// Name of the tool
        tool_name: String,
        /// Error message
        message: String,
    },

    // ============ Message Errors ============
    /// Message serialization failed
    #[error("Message serialization error: {0}")]
    MessageSerialize(#[from] serde_json::Error),

    // ============ Streaming Errors ============
    /// Stream interrupted
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    // ============ Retrieval Errors ============
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store read or write failed
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Vector does not match the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the store was configured with
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },

    // ============ Configuration Errors ============
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ Network Errors ============
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ============ System Errors ============
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============ Generic Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a new agent configuration error
    pub fn agent_config(msg: impl Into<String>) -> Self {
        Self::AgentConfig(msg.into())
    }

    /// Create a new tool execution error
    pub fn tool_execution(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is retryable
    ///
    /// Nothing in the assistant retries on its own; callers may.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderRateLimit { .. } | Self::StreamInterrupted(_) | Self::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::ProviderRateLimit { retry_after_secs: 3 }.is_retryable());
        assert!(Error::StreamInterrupted("eof".into()).is_retryable());
        assert!(!Error::ToolNotFound("x".into()).is_retryable());
        assert!(!Error::DimensionMismatch { expected: 3, actual: 2 }.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::DimensionMismatch { expected: 384, actual: 2 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 384, got 2");

        let err = Error::tool_execution("search_flights", "boom");
        assert_eq!(err.to_string(), "Tool execution error: search_flights - boom");
    }
}
