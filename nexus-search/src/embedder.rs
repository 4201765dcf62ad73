//! Deterministic text embeddings via feature hashing
//!
//! Each lowercased word and each character trigram of a word is hashed with
//! SHA-256 into one of `dimension` buckets with a sign taken from the hash,
//! and the result is L2-normalized. No model files are required, and the same
//! text always yields the same vector.
//!
//! Similarity is purely lexical, so distances are not comparable to those of a
//! sentence model and the default search threshold does not apply to them.

use async_trait::async_trait;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::{Result, SearchError};
use nexus_core::rag::Embeddings;

/// Output size used when none is configured
pub const DEFAULT_DIMENSION: usize = 384;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(SearchError::Model(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(SearchError::EmptyText);
        }

        let mut vector = vec![0.0f32; self.dimension];
        for word in words(text) {
            self.accumulate(&mut vector, "w", &word, WORD_WEIGHT);

            let padded: Vec<char> = format!("^{}$", word).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.accumulate(&mut vector, "t", &gram, TRIGRAM_WEIGHT);
            }
        }

        normalize(&mut vector);
        Ok(vector)
    }

    /// Embed a batch in parallel, preserving order
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.par_iter().map(|t| self.embed_text(t)).collect()
    }

    fn accumulate(&self, vector: &mut [f32], kind: &str, feature: &str, weight: f32) {
        let digest = Sha256::new()
            .chain_update(kind.as_bytes())
            .chain_update([0u8])
            .chain_update(feature.as_bytes())
            .finalize();

        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

/// Lowercased alphanumeric runs
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// L2 normalize in place; zero vectors stay zero
pub(crate) fn normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vec.iter_mut().for_each(|x| *x /= norm);
    }
}

#[async_trait]
impl Embeddings for HashingEmbedder {
    async fn embed(&self, text: &str) -> nexus_core::error::Result<Vec<f32>> {
        Ok(self.embed_text(text)?)
    }

    async fn embed_many(&self, texts: &[String]) -> nexus_core::error::Result<Vec<Vec<f32>>> {
        Ok(self.embed_batch(texts)?)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
