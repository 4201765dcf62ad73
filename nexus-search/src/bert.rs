//! Sentence embeddings from a local BERT model (all-MiniLM-L6-v2 layout)
//!
//! Mean pooling over the attention mask followed by L2 normalization.
//! The model directory must contain `model.safetensors`, `tokenizer.json`
//! and `config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::{Result, SearchError};
use nexus_core::rag::Embeddings;

/// Longest input, in tokens, the model accepts
const MAX_TOKENS: usize = 512;

/// Configuration for the embedder
#[derive(Debug, Clone)]
pub struct BertConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub config_path: PathBuf,
    /// cpu, cuda, metal, or auto. Default: auto
    pub device: Option<String>,
}

impl BertConfig {
    /// Standard file names inside `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model_path: dir.join("model.safetensors"),
            tokenizer_path: dir.join("tokenizer.json"),
            config_path: dir.join("config.json"),
            device: None,
        }
    }
}

impl Default for BertConfig {
    fn default() -> Self {
        Self::from_dir("models")
    }
}

struct Inner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// BERT embedder; cheap to clone
#[derive(Clone)]
pub struct BertEmbedder {
    inner: Arc<Inner>,
    dimension: usize,
}

fn model_err(context: &str) -> impl Fn(candle_core::Error) -> SearchError + '_ {
    move |e| SearchError::Model(format!("{}: {}", context, e))
}

fn select_device(choice: Option<&str>) -> Result<Device> {
    match choice {
        Some("cpu") => Ok(Device::Cpu),
        Some("cuda") => Device::new_cuda(0).map_err(model_err("CUDA error")),
        Some("metal") => Device::new_metal(0).map_err(model_err("Metal error")),
        Some("auto") | None => {
            if candle_core::utils::cuda_is_available() {
                tracing::info!("Auto-detected CUDA, using GPU");
                Device::new_cuda(0).map_err(model_err("CUDA error"))
            } else if candle_core::utils::metal_is_available() {
                tracing::info!("Auto-detected Metal, using GPU");
                Device::new_metal(0).map_err(model_err("Metal error"))
            } else {
                tracing::info!("Using CPU");
                Ok(Device::Cpu)
            }
        }
        Some(d) => Err(SearchError::Model(format!("Unknown device: {}", d))),
    }
}

impl BertEmbedder {
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(BertConfig::from_dir(dir))
    }

    pub fn with_config(config: BertConfig) -> Result<Self> {
        let device = select_device(config.device.as_deref())?;

        let config_content = std::fs::read_to_string(&config.config_path).map_err(|e| {
            SearchError::Model(format!(
                "Failed to read {}: {}",
                config.config_path.display(),
                e
            ))
        })?;
        let bert_config: Config = serde_json::from_str(&config_content)
            .map_err(|e| SearchError::Model(format!("Failed to parse model config: {}", e)))?;

        // SAFETY: the weights file is opened read-only and not modified while mapped.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[config.model_path.clone()], DType::F32, &device)
        }
        .map_err(model_err("Failed to load safetensors"))?;

        let model = BertModel::load(vb, &bert_config).map_err(model_err("Failed to load BertModel"))?;

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| SearchError::Model(format!("Failed to load tokenizer: {}", e)))?;

        if let Some(pp) = tokenizer.get_padding_mut() {
            pp.strategy = PaddingStrategy::BatchLongest;
        } else {
            tokenizer.with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..Default::default()
            }));
        }
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| SearchError::Model(format!("Failed to set truncation: {}", e)))?;

        let dimension = bert_config.hidden_size;
        tracing::info!(dimension, model = %config.model_path.display(), "BERT embedder loaded");

        Ok(Self {
            inner: Arc::new(Inner {
                model,
                tokenizer,
                device,
            }),
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(SearchError::EmptyText);
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let inner = &self.inner;

        let encodings = inner
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| SearchError::Model(format!("Tokenization failed: {}", e)))?;

        let token_ids = encodings
            .iter()
            .map(|t| Tensor::new(t.get_ids(), &inner.device))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(model_err("Tensor creation failed"))?;
        let token_ids = Tensor::stack(&token_ids, 0).map_err(model_err("Stack failed"))?;
        let token_type_ids = token_ids.zeros_like().map_err(model_err("Zeros failed"))?;

        // 1 for real tokens, 0 for padding
        let attention_mask = token_ids
            .ne(0u32)
            .and_then(|m| m.to_dtype(DType::U32))
            .map_err(model_err("Mask failed"))?;

        let hidden = inner
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))
            .map_err(model_err("Model forward failed"))?;

        let pooled = mean_pool(&hidden, &attention_mask).map_err(model_err("Pooling failed"))?;
        let normalized = l2_normalize(&pooled).map_err(model_err("Normalize failed"))?;

        normalized
            .to_vec2::<f32>()
            .map_err(model_err("Tensor readback failed"))
    }
}

/// Average token vectors, ignoring padding
fn mean_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = mask.to_dtype(DType::F32)?;
    let expanded = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let summed = hidden.mul(&expanded)?.sum(1)?;
    let counts = mask
        .sum(1)?
        .clamp(1e-9, f32::MAX)?
        .unsqueeze(1)?
        .broadcast_as(summed.shape())?;
    summed.div(&counts)
}

fn l2_normalize(t: &Tensor) -> candle_core::Result<Tensor> {
    let norm = t.sqr()?.sum_keepdim(1)?.sqrt()?;
    t.broadcast_div(&norm)
}

#[async_trait]
impl Embeddings for BertEmbedder {
    async fn embed(&self, text: &str) -> nexus_core::error::Result<Vec<f32>> {
        self.embed_many(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| nexus_core::error::Error::Embedding("no embedding produced".into()))
    }

    async fn embed_many(&self, texts: &[String]) -> nexus_core::error::Result<Vec<Vec<f32>>> {
        let this = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || this.embed_batch(&texts))
            .await
            .map_err(|e| nexus_core::error::Error::Internal(e.to_string()))?
            .map_err(Into::into)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Require model files under ./models
    // Run with: cargo test -p nexus-search --features bert -- --ignored

    #[test]
    #[ignore]
    fn test_embed_batch_dimension_and_norm() {
        let embedder = BertEmbedder::from_dir("models").expect("model loads");
        let texts = vec![
            "Each passenger may check two bags".to_string(),
            "Pets travel in the cabin".to_string(),
        ];
        let vectors = embedder.embed_batch(&texts).expect("embeds");

        assert_eq!(vectors.len(), 2);
        for v in vectors {
            assert_eq!(v.len(), embedder.dimension());
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_missing_model_dir_is_a_model_error() {
        let err = BertEmbedder::with_config(BertConfig {
            device: Some("cpu".to_string()),
            ..BertConfig::from_dir("/nonexistent/models")
        })
        .err()
        .expect("loading fails");
        assert!(matches!(err, SearchError::Model(_)));
    }

    #[test]
    fn test_from_dir_paths() {
        let config = BertConfig::from_dir("m");
        assert_eq!(config.tokenizer_path, PathBuf::from("m/tokenizer.json"));
        assert_eq!(config.config_path, PathBuf::from("m/config.json"));
    }
}
