//! Moonshot (Kimi) provider implementation
//!
//! Kimi AI is OpenAI-compatible.
//! Base URL: https://api.moonshot.ai/v1

use async_trait::async_trait;
use nexus_core::config::ModelConfig;

use crate::openai::OpenAI;
use crate::{ChatRequest, Error, HttpConfig, Provider, Result, StreamingResponse};

/// Default endpoint
pub const MOONSHOT_BASE_URL: &str = "https://api.moonshot.ai/v1";

/// Kimi K2 preview model
pub const KIMI_K2: &str = "kimi-k2-0711-preview";

/// Moonshot API client (OpenAI compatible)
pub struct Moonshot {
    inner: OpenAI,
}

impl Moonshot {
    /// Create from API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let inner = OpenAI::with_base_url(api_key, MOONSHOT_BASE_URL)?;
        Ok(Self { inner })
    }

    /// Create from environment variable (MOONSHOT_API_KEY)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("MOONSHOT_API_KEY")
            .map_err(|_| Error::ProviderAuth("MOONSHOT_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }

    /// Build from model settings; the key is passed in already resolved
    pub fn from_config(api_key: impl Into<String>, config: &ModelConfig) -> Result<Self> {
        let http = HttpConfig::with_timeout(config.timeout_secs);
        let inner = OpenAI::with_http_config(api_key, &config.base_url, &http)?;
        Ok(Self { inner })
    }

    /// Endpoint in use
    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }
}

#[async_trait]
impl Provider for Moonshot {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        self.inner.stream_completion(request).await
    }

    fn name(&self) -> &'static str {
        "moonshot"
    }
}
