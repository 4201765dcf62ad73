//! # Nexus Search
//!
//! Policy retrieval for the AirlineNexus assistant:
//! - **Embeddings**: local all-MiniLM-L6-v2 (`bert`, on by default), a remote
//!   OpenAI-compatible endpoint, or lexical feature hashing for tests
//! - **Policy index**: exact cosine search, persisted with bincode
//! - **Ingestion**: incremental by content hash, or a full reload
//! - **Runtime**: lazily built singletons implementing `PolicyLookup`
//!
//! ```rust,no_run
//! use nexus_core::config::SearchConfig;
//! use nexus_core::rag::PolicyLookup;
//! use nexus_search::{IngestMode, SearchRuntime};
//!
//! # async fn run() -> nexus_core::error::Result<()> {
//! let runtime = SearchRuntime::new(SearchConfig::default());
//! runtime
//!     .ingest_file("data/airline_policies.json", IngestMode::Incremental)
//!     .await?;
//!
//! for policy in runtime.lookup("How many bags can I check?").await? {
//!     println!("{} ({:.3})", policy.title, policy.distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod content_hash;
pub mod embedder;
pub mod error;
pub mod index;
pub mod ingest;
pub mod runtime;

#[cfg(feature = "bert")]
pub mod bert;

pub use content_hash::hash_content;
pub use embedder::{HashingEmbedder, DEFAULT_DIMENSION};
pub use error::{Result, SearchError};
pub use index::{cosine_distance, IndexEntry, PolicyIndex};
pub use ingest::{ingest, ingest_file, load_policies, parse_policies, IngestMode, IngestReport};
pub use runtime::SearchRuntime;

#[cfg(feature = "bert")]
pub use bert::{BertConfig, BertEmbedder};
