//! RAG (Retrieval-Augmented Generation) interfaces
//!
//! Defines the embedding and vector store seams used by the policy responder.
//! The in-process index lives in `nexus-search`; remote embeddings live in
//! `nexus-providers`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{Error, Result};

/// Metadata key holding the policy title
pub const TITLE_KEY: &str = "title";
/// Metadata key holding the policy category
pub const CATEGORY_KEY: &str = "category";

/// Interface for embeddings providers
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Generate embedding vector for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving length and order
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Length of every vector this service produces
    fn dimension(&self) -> usize;
}

/// One nearest-neighbour match
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    /// Id the entry was upserted under
    pub id: String,
    /// Cosine distance, smaller is closer
    pub distance: f32,
    /// Stored document text
    pub document: String,
    /// Stored metadata
    pub metadata: HashMap<String, String>,
}

/// Interface for vector stores
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the entry with this id
    async fn upsert(
        &self,
        id: &str,
        text: &str,
        vector: Vec<f32>,
        metadata: HashMap<String, String>,
    ) -> Result<()>;

    /// Up to `k` nearest entries, ascending by distance
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<QueryHit>>;
}

/// A policy document as ingested from the policy file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Stable id, assigned at ingestion
    #[serde(default)]
    pub id: String,
    /// Short title
    pub title: String,
    /// Category such as "baggage" or "refunds"
    pub category: String,
    /// Full policy text
    pub content: String,
}

impl PolicyDocument {
    /// Metadata stored next to the embedded content
    pub fn metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            (TITLE_KEY.to_string(), self.title.clone()),
            (CATEGORY_KEY.to_string(), self.category.clone()),
        ])
    }
}

/// A policy that survived the distance cutoff
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicySearchResult {
    /// Policy title
    pub title: String,
    /// Policy text
    pub content: String,
    /// Policy category
    pub category: String,
    /// Distance to the query
    pub distance: f32,
}

impl From<QueryHit> for PolicySearchResult {
    fn from(hit: QueryHit) -> Self {
        let mut metadata = hit.metadata;
        Self {
            title: metadata.remove(TITLE_KEY).unwrap_or_default(),
            category: metadata.remove(CATEGORY_KEY).unwrap_or_default(),
            content: hit.document,
            distance: hit.distance,
        }
    }
}

/// Keep hits strictly closer than `threshold`, preserving order
pub fn filter_hits(hits: Vec<QueryHit>, threshold: f32) -> Vec<PolicySearchResult> {
    hits.into_iter()
        .filter(|hit| hit.distance < threshold)
        .map(PolicySearchResult::from)
        .collect()
}

/// Anything that can answer "which policies match this question"
#[async_trait]
pub trait PolicyLookup: Send + Sync {
    /// Policies relevant to `query`, nearest first, already thresholded
    async fn lookup(&self, query: &str) -> Result<Vec<PolicySearchResult>>;
}

/// Semantic policy lookup: embed, query, then apply the distance cutoff
#[derive(Clone)]
pub struct PolicyRetriever {
    embeddings: Arc<dyn Embeddings>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
    threshold: f32,
}

impl PolicyRetriever {
    /// Retriever with the default top-3 / 0.7 cutoff
    pub fn new(embeddings: Arc<dyn Embeddings>, store: Arc<dyn VectorStore>) -> Self {
        let defaults = SearchConfig::default();
        Self {
            embeddings,
            store,
            top_k: defaults.top_k,
            threshold: defaults.distance_threshold,
        }
    }

    /// Retriever using the limits from `config`
    pub fn from_config(
        embeddings: Arc<dyn Embeddings>,
        store: Arc<dyn VectorStore>,
        config: &SearchConfig,
    ) -> Self {
        Self::new(embeddings, store).with_limits(config.top_k, config.distance_threshold)
    }

    /// Override top-k and threshold
    pub fn with_limits(mut self, top_k: usize, threshold: f32) -> Self {
        self.top_k = top_k;
        self.threshold = threshold;
        self
    }

    /// Number of candidates requested from the store
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Distance cutoff; hits at or above it are dropped
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Policies relevant to `query`, nearest first
    pub async fn search(&self, query: &str) -> Result<Vec<PolicySearchResult>> {
        if query.trim().is_empty() {
            return Err(Error::Embedding("query text is empty".to_string()));
        }
        let vector = self.embeddings.embed(query).await?;
        let hits = self.store.query(&vector, self.top_k).await?;
        let candidates = hits.len();
        let results = filter_hits(hits, self.threshold);
        debug!(
            candidates,
            kept = results.len(),
            threshold = self.threshold,
            "policy search finished"
        );
        Ok(results)
    }
}

#[async_trait]
impl PolicyLookup for PolicyRetriever {
    async fn lookup(&self, query: &str) -> Result<Vec<PolicySearchResult>> {
        self.search(query).await
    }
}
