//! Policy ingestion: read the policy file, embed, and fill the index

use std::path::Path;

use tracing::{debug, info};

use crate::content_hash::{hash_content, short_hash};
use crate::error::{Result, SearchError};
use crate::index::PolicyIndex;
use nexus_core::rag::{Embeddings, PolicyDocument};

/// How existing index contents are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Re-embed only new or changed policies and drop ones no longer present
    #[default]
    Incremental,
    /// Empty the index and embed everything
    FullReload,
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Policies read from the file
    pub total: usize,
    /// Policies (re-)embedded
    pub embedded: usize,
    /// Policies whose stored content hash already matched
    pub unchanged: usize,
    /// Stale entries dropped from the index
    pub removed: usize,
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Successfully ingested {} airline policies with embeddings ({} embedded, {} unchanged, {} removed)",
            self.total, self.embedded, self.unchanged, self.removed
        )
    }
}

/// Parse a JSON array of `{title, category, content}` objects.
/// Ids are assigned "1".."n" in file order.
pub fn parse_policies(json: &str) -> Result<Vec<PolicyDocument>> {
    let mut policies: Vec<PolicyDocument> = serde_json::from_str(json)?;
    for (i, policy) in policies.iter_mut().enumerate() {
        if policy.content.trim().is_empty() {
            return Err(SearchError::InvalidPolicies(format!(
                "policy {} ({:?}) has empty content",
                i + 1,
                policy.title
            )));
        }
        policy.id = (i + 1).to_string();
    }
    Ok(policies)
}

pub fn load_policies(path: impl AsRef<Path>) -> Result<Vec<PolicyDocument>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| {
        SearchError::InvalidPolicies(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_policies(&json)
}

/// Embed `policies` into `index`
pub async fn ingest(
    embeddings: &dyn Embeddings,
    index: &PolicyIndex,
    policies: &[PolicyDocument],
    mode: IngestMode,
) -> nexus_core::error::Result<IngestReport> {
    if embeddings.dimension() != index.dimension() {
        return Err(SearchError::DimensionMismatch {
            expected: index.dimension(),
            actual: embeddings.dimension(),
        }
        .into());
    }

    let mut report = IngestReport {
        total: policies.len(),
        ..Default::default()
    };

    match mode {
        IngestMode::FullReload => {
            report.removed = index.len();
            index.clear();
        }
        IngestMode::Incremental => {
            for id in index.ids() {
                if !policies.iter().any(|p| p.id == id) && index.remove(&id) {
                    report.removed += 1;
                }
            }
        }
    }

    let pending: Vec<&PolicyDocument> = policies
        .iter()
        .filter(|p| {
            let hash = hash_content(&p.content);
            let fresh = index.content_hash(&p.id).as_deref() != Some(hash.as_str());
            if !fresh {
                debug!(id = %p.id, hash = short_hash(&hash), "policy unchanged");
            }
            fresh
        })
        .collect();
    report.unchanged = policies.len() - pending.len();

    if !pending.is_empty() {
        let texts: Vec<String> = pending.iter().map(|p| p.content.clone()).collect();
        let vectors = embeddings.embed_many(&texts).await?;
        for (policy, vector) in pending.iter().zip(vectors) {
            index.insert(&policy.id, &policy.content, vector, policy.metadata())?;
        }
        report.embedded = pending.len();
    }

    info!(
        total = report.total,
        embedded = report.embedded,
        unchanged = report.unchanged,
        removed = report.removed,
        "policy ingestion finished"
    );
    Ok(report)
}

/// Load the policy file, ingest it, and persist the index
pub async fn ingest_file(
    embeddings: &dyn Embeddings,
    index: &PolicyIndex,
    policies_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    mode: IngestMode,
) -> nexus_core::error::Result<IngestReport> {
    let policies = load_policies(policies_path)?;
    let report = ingest(embeddings, index, &policies, mode).await?;
    if index.is_dirty() {
        index.save(index_path)?;
    }
    Ok(report)
}
