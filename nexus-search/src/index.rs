//! In-process policy vector index
//!
//! Exact cosine search over every stored entry. Policy sets are small, so a
//! linear scan (parallelized with rayon) is both simpler and exact.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::content_hash::hash_content;
use crate::error::{Result, SearchError};
use nexus_core::rag::{QueryHit, VectorStore};

/// Bumped when the on-disk layout changes
const FORMAT_VERSION: u32 = 1;

/// One stored policy vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub document: String,
    pub metadata: HashMap<String, String>,
    /// SHA-256 of `document` at the time it was embedded
    pub content_hash: String,
    pub vector: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct IndexData {
    version: u32,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

/// Cosine distance `1 - cos(a, b)`, clamped to `[0, 2]`.
/// A zero vector is at distance 1 from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (na.sqrt() * nb.sqrt())).clamp(0.0, 2.0)
}

/// Policy vectors in insertion order
pub struct PolicyIndex {
    dimension: usize,
    entries: RwLock<Vec<IndexEntry>>,
    dirty: AtomicBool,
}

impl PolicyIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(Vec::new()),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Insert, or replace in place when the id already exists
    pub fn insert(
        &self,
        id: &str,
        text: &str,
        vector: Vec<f32>,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        self.check_dimension(&vector)?;

        let entry = IndexEntry {
            id: id.to_string(),
            document: text.to_string(),
            metadata,
            content_hash: hash_content(text),
            vector,
        };

        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Up to `k` nearest entries, ascending by distance.
    /// Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryHit>> {
        self.check_dimension(query)?;

        let entries = self.entries.read();
        if entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = entries
            .par_iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_distance(query, &e.vector)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, distance)| {
                let e = &entries[i];
                QueryHit {
                    id: e.id.clone(),
                    distance,
                    document: e.document.clone(),
                    metadata: e.metadata.clone(),
                }
            })
            .collect())
    }

    pub fn content_hash(&self, id: &str) -> Option<String> {
        self.entries
            .read()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.content_hash.clone())
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.id.clone()).collect()
    }

    /// Drop the entry with this id; returns whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            self.dirty.store(true, Ordering::Release);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.dirty.store(true, Ordering::Release);
    }

    /// Write to `path` through a temp file and rename
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let entries = self.entries.read();
            let data = IndexData {
                version: FORMAT_VERSION,
                dimension: self.dimension,
                entries: entries.clone(),
            };
            let file = std::fs::File::create(&tmp_path)?;
            let writer = std::io::BufWriter::new(file);
            bincode::serialize_into(writer, &data)?;
        }
        std::fs::rename(&tmp_path, path)?;

        self.dirty.store(false, Ordering::Release);
        tracing::debug!(path = %path.display(), entries = self.len(), "policy index saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);
        let data: IndexData = bincode::deserialize_from(reader)?;

        if data.version != FORMAT_VERSION {
            return Err(SearchError::Custom(format!(
                "unsupported index format version {}",
                data.version
            )));
        }
        if let Some(bad) = data.entries.iter().find(|e| e.vector.len() != data.dimension) {
            return Err(SearchError::DimensionMismatch {
                expected: data.dimension,
                actual: bad.vector.len(),
            });
        }

        Ok(Self {
            dimension: data.dimension,
            entries: RwLock::new(data.entries),
            dirty: AtomicBool::new(false),
        })
    }

    /// Load `path` if it exists, otherwise start empty.
    /// An existing index built with another dimension is an error.
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new(dimension));
        }
        let index = Self::load(path)?;
        if index.dimension != dimension {
            return Err(SearchError::DimensionMismatch {
                expected: dimension,
                actual: index.dimension,
            });
        }
        Ok(index)
    }
}

#[async_trait]
impl VectorStore for PolicyIndex {
    async fn upsert(
        &self,
        id: &str,
        text: &str,
        vector: Vec<f32>,
        metadata: HashMap<String, String>,
    ) -> nexus_core::error::Result<()> {
        Ok(self.insert(id, text, vector, metadata)?)
    }

    async fn query(&self, vector: &[f32], k: usize) -> nexus_core::error::Result<Vec<QueryHit>> {
        Ok(self.search(vector, k)?)
    }
}
