//! Lazily constructed embedding service and policy index

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use crate::embedder::HashingEmbedder;
use crate::error::SearchError;
use crate::index::PolicyIndex;
use crate::ingest::{self, IngestMode, IngestReport};
use nexus_core::config::{EmbedderKind, SearchConfig};
use nexus_core::error::{Error, Result};
use nexus_core::rag::{Embeddings, PolicyLookup, PolicyRetriever, PolicySearchResult};
use nexus_providers::openai::OpenAI;

/// Owns the embedder and index, building each on first use and sharing it
/// read-only afterwards.
pub struct SearchRuntime {
    config: SearchConfig,
    embeddings: OnceCell<Arc<dyn Embeddings>>,
    index: OnceCell<Arc<PolicyIndex>>,
}

impl SearchRuntime {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            embeddings: OnceCell::new(),
            index: OnceCell::new(),
        }
    }

    /// Use an existing embedding service instead of building one from config
    pub fn with_embeddings(config: SearchConfig, embeddings: Arc<dyn Embeddings>) -> Self {
        Self {
            config,
            embeddings: OnceCell::new_with(Some(embeddings)),
            index: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// True once both singletons exist
    pub fn is_initialized(&self) -> bool {
        self.embeddings.initialized() && self.index.initialized()
    }

    pub async fn embeddings(&self) -> Result<Arc<dyn Embeddings>> {
        self.embeddings
            .get_or_try_init(|| async { build_embeddings(&self.config) })
            .await
            .cloned()
    }

    pub async fn index(&self) -> Result<Arc<PolicyIndex>> {
        self.index
            .get_or_try_init(|| async {
                let index = PolicyIndex::open(&self.config.index_path, self.config.dimension)?;
                info!(
                    path = %self.config.index_path.display(),
                    entries = index.len(),
                    "policy index opened"
                );
                Ok::<_, Error>(Arc::new(index))
            })
            .await
            .cloned()
    }

    /// Retriever over the shared singletons with the configured limits
    pub async fn retriever(&self) -> Result<PolicyRetriever> {
        let embeddings = self.embeddings().await?;
        let index = self.index().await?;
        Ok(PolicyRetriever::from_config(
            embeddings,
            index,
            &self.config,
        ))
    }

    /// Ingest a policy file into the shared index and save it
    pub async fn ingest_file(
        &self,
        policies_path: impl AsRef<Path>,
        mode: IngestMode,
    ) -> Result<IngestReport> {
        let embeddings = self.embeddings().await?;
        let index = self.index().await?;
        ingest::ingest_file(
            embeddings.as_ref(),
            &index,
            policies_path,
            &self.config.index_path,
            mode,
        )
        .await
    }
}

fn build_embeddings(config: &SearchConfig) -> Result<Arc<dyn Embeddings>> {
    let embeddings: Arc<dyn Embeddings> = match config.embedder {
        EmbedderKind::Bert => bert_embeddings(config)?,
        EmbedderKind::Remote => Arc::new(OpenAI::embeddings_from_config(
            config.remote.api_key()?,
            &config.remote,
            config.dimension,
        )?),
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(config.dimension)?),
    };

    if embeddings.dimension() != config.dimension {
        return Err(SearchError::DimensionMismatch {
            expected: config.dimension,
            actual: embeddings.dimension(),
        }
        .into());
    }
    info!(kind = ?config.embedder, dimension = config.dimension, "embedding service ready");
    Ok(embeddings)
}

#[cfg(feature = "bert")]
fn bert_embeddings(config: &SearchConfig) -> Result<Arc<dyn Embeddings>> {
    Ok(Arc::new(crate::bert::BertEmbedder::from_dir(&config.model_dir)?))
}

#[cfg(not(feature = "bert"))]
fn bert_embeddings(_config: &SearchConfig) -> Result<Arc<dyn Embeddings>> {
    Err(Error::config(
        "embedder `bert` requires nexus-search to be built with the `bert` feature; \
         set search.embedder to `remote` or `hashing`",
    ))
}

#[async_trait]
impl PolicyLookup for SearchRuntime {
    async fn lookup(&self, query: &str) -> Result<Vec<PolicySearchResult>> {
        self.retriever().await?.search(query).await
    }
}
