//! Runtime configuration
//!
//! Loaded from YAML (every field has a default), then overridden from the
//! environment. API keys are never stored in the file, only the name of the
//! variable holding them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Hosted model settings
    pub model: ModelConfig,
    /// Policy search settings
    pub search: SearchConfig,
    /// Agent loop limits
    pub agent: AgentLimits,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Hosted language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Max tokens per completion
    pub max_tokens: u64,
    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.moonshot.ai/v1".to_string(),
            api_key_env: "MOONSHOT_API_KEY".to_string(),
            model: "kimi-k2-0711-preview".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

/// Which embedding backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    /// Local BERT sentence model (all-MiniLM-L6-v2, `bert` feature of nexus-search)
    Bert,
    /// OpenAI-compatible `/embeddings` endpoint, see [`RemoteEmbeddingConfig`]
    Remote,
    /// Deterministic feature hashing. Lexical only, meant for tests and offline demos
    Hashing,
}

/// Hosted embedding endpoint used by [`EmbedderKind::Remote`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteEmbeddingConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Embedding model; it is asked for `search.dimension` outputs
    pub model: String,
    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for RemoteEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RemoteEmbeddingConfig {
    /// Resolve the API key through `api_key_env`
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| Error::ProviderAuth(format!("{} not set", self.api_key_env)))
    }
}

/// Policy search settings
///
/// `distance_threshold` is only meaningful for the model it was tuned on.
/// The default 0.7 fits all-MiniLM-L6-v2; change it together with `embedder`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Embedding dimension shared by the embedder and the index
    pub dimension: usize,
    /// Number of nearest neighbours to fetch
    pub top_k: usize,
    /// Hits at or above this cosine distance are discarded
    pub distance_threshold: f32,
    /// Where the policy index is persisted
    pub index_path: PathBuf,
    /// Embedding backend
    pub embedder: EmbedderKind,
    /// Directory containing `model.safetensors`, `tokenizer.json`, `config.json`
    pub model_dir: PathBuf,
    /// Endpoint for the remote embedder
    pub remote: RemoteEmbeddingConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            top_k: 3,
            distance_threshold: 0.7,
            index_path: PathBuf::from("data/policy_index.bin"),
            embedder: EmbedderKind::Bert,
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            remote: RemoteEmbeddingConfig::default(),
        }
    }
}

/// Agent loop limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLimits {
    /// Max model round-trips per prompt
    pub max_steps: usize,
    /// Tool output longer than this is truncated
    pub max_tool_output_chars: usize,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            max_steps: 8,
            max_tool_output_chars: 4096,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rotated log files
    pub directory: String,
    /// Log file prefix
    pub file_prefix: String,
    /// Default level when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "nexus.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl NexusConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid config YAML: {}", e)))
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load from an optional file, apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("NEXUS_MODEL") {
            self.model.model = model;
        }
        if let Some(url) = lookup("NEXUS_BASE_URL") {
            self.model.base_url = url;
        }
        if let Some(path) = lookup("NEXUS_INDEX_PATH") {
            self.search.index_path = PathBuf::from(path);
        }
        if let Some(level) = lookup("NEXUS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Reject settings the search pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.search.dimension == 0 {
            return Err(Error::config("search.dimension must be at least 1"));
        }
        if self.search.top_k == 0 {
            return Err(Error::config("search.top_k must be at least 1"));
        }
        let threshold = self.search.distance_threshold;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(Error::config("search.distance_threshold must be positive"));
        }
        if self.model.model.is_empty() {
            return Err(Error::config("model.model cannot be empty"));
        }
        if self.agent.max_steps == 0 {
            return Err(Error::config("agent.max_steps must be at least 1"));
        }
        Ok(())
    }

    /// Resolve the API key through `model.api_key_env`
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.model.api_key_env).map_err(|_| {
            Error::ProviderAuth(format!("{} not set", self.model.api_key_env))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_deployment() {
        let config = NexusConfig::default();
        assert_eq!(config.model.model, "kimi-k2-0711-preview");
        assert_eq!(config.model.max_tokens, 1000);
        assert_eq!(config.search.dimension, 384);
        assert_eq!(config.search.top_k, 3);
        assert!((config.search.distance_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.search.embedder, EmbedderKind::Bert);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "search:\n  top_k: 5\n  embedder: hashing\nlogging:\n  level: debug\n";
        let config = NexusConfig::from_yaml_str(yaml).expect("yaml should parse");
        assert_eq!(config.search.top_k, 5);
        assert_eq!(config.search.embedder, EmbedderKind::Hashing);
        assert_eq!(config.search.dimension, 384);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.model.api_key_env, "MOONSHOT_API_KEY");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = NexusConfig::default();
        config.apply_env_with(|key| match key {
            "NEXUS_MODEL" => Some("moonshot-v1-8k".to_string()),
            "NEXUS_INDEX_PATH" => Some("/tmp/idx.bin".to_string()),
            _ => None,
        });
        assert_eq!(config.model.model, "moonshot-v1-8k");
        assert_eq!(config.search.index_path, PathBuf::from("/tmp/idx.bin"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_search_settings() {
        let mut config = NexusConfig::default();
        config.search.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = NexusConfig::default();
        config.search.distance_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = NexusConfig::default();
        config.search.dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_remote_embedder_settings() {
        let yaml = "search:\n  embedder: remote\n  remote:\n    model: text-embedding-3-large\n";
        let config = NexusConfig::from_yaml_str(yaml).expect("yaml should parse");
        assert_eq!(config.search.embedder, EmbedderKind::Remote);
        assert_eq!(config.search.remote.model, "text-embedding-3-large");
        assert_eq!(config.search.remote.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_remote_api_key_missing() {
        let remote = RemoteEmbeddingConfig {
            api_key_env: "NEXUS_TEST_UNSET_EMBEDDING_KEY".to_string(),
            ..Default::default()
        };
        assert!(matches!(remote.api_key(), Err(Error::ProviderAuth(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(NexusConfig::from_yaml_str("search: [1, 2").is_err());
    }
}
