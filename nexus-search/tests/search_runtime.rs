use std::sync::Arc;

use nexus_core::config::{EmbedderKind, RemoteEmbeddingConfig, SearchConfig};
use nexus_core::error::Error;
use nexus_core::rag::{Embeddings, PolicyLookup, VectorStore};
use nexus_search::{HashingEmbedder, IngestMode, PolicyIndex, SearchRuntime};

const POLICIES: &str = r#"[
    {"title": "Checked Baggage Allowance", "category": "baggage",
     "content": "Economy passengers may check one bag of up to 23kg. Business and first class passengers may check two bags of up to 32kg each."},
    {"title": "Pets in the Cabin", "category": "pets",
     "content": "Small cats and dogs may travel in the cabin inside an approved carrier that fits under the seat."},
    {"title": "Refunds for Cancelled Flights", "category": "refunds",
     "content": "If the airline cancels your flight you are entitled to a full refund to the original form of payment."}
]"#;

fn config_in(dir: &tempfile::TempDir) -> SearchConfig {
    SearchConfig {
        index_path: dir.path().join("policy_index.bin"),
        embedder: EmbedderKind::Hashing,
        ..SearchConfig::default()
    }
}

async fn ingested_runtime(dir: &tempfile::TempDir) -> SearchRuntime {
    let policies_path = dir.path().join("policies.json");
    std::fs::write(&policies_path, POLICIES).expect("write policies");

    let runtime = SearchRuntime::new(config_in(dir));
    let report = runtime
        .ingest_file(&policies_path, IngestMode::Incremental)
        .await
        .expect("ingest succeeds");
    assert_eq!(report.embedded, 3);
    runtime
}

#[tokio::test]
async fn self_query_returns_the_policy_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = ingested_runtime(&dir).await;

    let embeddings = runtime.embeddings().await.expect("embedder");
    let index = runtime.index().await.expect("index");
    let content = "Economy passengers may check one bag of up to 23kg. Business and first class passengers may check two bags of up to 32kg each.";
    let vector = embeddings.embed(content).await.expect("embeds");

    let hits = index.query(&vector, 3).await.expect("query");
    assert_eq!(hits[0].id, "1");
    assert!(hits[0].distance < 1e-5, "distance was {}", hits[0].distance);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn lookup_keeps_close_policies_and_drops_distant_ones() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = ingested_runtime(&dir).await;

    let results = runtime
        .lookup("small cats and dogs may travel in the cabin")
        .await
        .expect("lookup");
    assert!(!results.is_empty());
    assert_eq!(results[0].title, "Pets in the Cabin");
    assert_eq!(results[0].category, "pets");
    assert!(results.len() <= 3);
    assert!(results.iter().all(|r| r.distance < 0.7));

    let results = runtime.lookup("zzzz qqqq xxxx").await.expect("lookup");
    assert!(results.is_empty());
}

#[tokio::test]
async fn index_is_persisted_and_reopened() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = ingested_runtime(&dir).await;
    assert!(runtime.is_initialized());
    drop(runtime);

    let reopened = SearchRuntime::new(config_in(&dir));
    assert!(!reopened.is_initialized());
    let index = reopened.index().await.expect("index loads");
    assert_eq!(index.len(), 3);
}

#[tokio::test]
async fn second_ingest_is_incremental() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = ingested_runtime(&dir).await;

    let report = runtime
        .ingest_file(dir.path().join("policies.json"), IngestMode::Incremental)
        .await
        .expect("ingest succeeds");
    assert_eq!(report.embedded, 0);
    assert_eq!(report.unchanged, 3);
}

#[tokio::test]
async fn query_with_wrong_dimension_is_rejected() {
    let index = PolicyIndex::new(384);
    let err = index.query(&[1.0, 0.0], 3).await.expect_err("mismatch");
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 384,
            actual: 2
        }
    ));
}

#[tokio::test]
async fn injected_embedder_must_match_configured_dimension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let embeddings: Arc<dyn Embeddings> = Arc::new(HashingEmbedder::new(16).expect("dim"));
    let runtime = SearchRuntime::with_embeddings(config_in(&dir), embeddings);

    assert!(runtime.lookup("baggage").await.is_err());
}

#[cfg(not(feature = "bert"))]
#[tokio::test]
async fn bert_embedder_requires_feature() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = SearchRuntime::new(SearchConfig {
        embedder: EmbedderKind::Bert,
        ..config_in(&dir)
    });

    assert!(matches!(
        runtime.embeddings().await,
        Err(Error::Config(_))
    ));
}

fn remote_config(dir: &tempfile::TempDir, base_url: String, key_env: &str) -> SearchConfig {
    SearchConfig {
        dimension: 3,
        embedder: EmbedderKind::Remote,
        remote: RemoteEmbeddingConfig {
            base_url,
            api_key_env: key_env.to_string(),
            ..RemoteEmbeddingConfig::default()
        },
        ..config_in(dir)
    }
}

#[tokio::test]
async fn remote_embedder_drives_ingest_and_lookup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let policies_path = dir.path().join("policies.json");
    std::fs::write(&policies_path, POLICIES).expect("write policies");

    let contents: Vec<String> = nexus_search::parse_policies(POLICIES)
        .expect("policies parse")
        .into_iter()
        .map(|p| p.content)
        .collect();

    let mut server = mockito::Server::new_async().await;
    let _batch = server
        .mock("POST", "/embeddings")
        .match_header("authorization", "Bearer remote-test-key")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "input": contents,
            "dimensions": 3
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data":[
                {"index":0,"embedding":[1.0,0.0,0.0]},
                {"index":1,"embedding":[0.0,1.0,0.0]},
                {"index":2,"embedding":[0.0,0.0,1.0]}]}"#,
        )
        .create_async()
        .await;
    let _query = server
        .mock("POST", "/embeddings")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "input": ["Can I bring my cat on the plane?"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[{"index":0,"embedding":[0.1,0.99,0.0]}]}"#)
        .create_async()
        .await;

    std::env::set_var("NEXUS_SEARCH_TEST_REMOTE_KEY", "remote-test-key");
    let runtime = SearchRuntime::new(remote_config(
        &dir,
        server.url(),
        "NEXUS_SEARCH_TEST_REMOTE_KEY",
    ));

    let report = runtime
        .ingest_file(&policies_path, IngestMode::Incremental)
        .await
        .expect("ingest succeeds");
    assert_eq!(report.embedded, 3);

    let results = runtime
        .lookup("Can I bring my cat on the plane?")
        .await
        .expect("lookup");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Pets in the Cabin");
}

#[tokio::test]
async fn remote_embedder_without_key_is_an_auth_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let server = mockito::Server::new_async().await;
    let runtime = SearchRuntime::new(remote_config(
        &dir,
        server.url(),
        "NEXUS_SEARCH_TEST_UNSET_KEY",
    ));

    assert!(matches!(
        runtime.embeddings().await,
        Err(Error::ProviderAuth(_))
    ));
}

// Requires all-MiniLM-L6-v2 (model.safetensors, tokenizer.json, config.json)
// in models/all-MiniLM-L6-v2 at the workspace root
#[cfg(feature = "bert")]
#[tokio::test]
#[ignore]
async fn bert_lookup_finds_the_matching_airline_policy() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = SearchRuntime::new(SearchConfig {
        index_path: dir.path().join("policy_index.bin"),
        model_dir: root.join("models/all-MiniLM-L6-v2"),
        ..SearchConfig::default()
    });

    let report = runtime
        .ingest_file(root.join("data/airline_policies.json"), IngestMode::FullReload)
        .await
        .expect("ingest succeeds");
    assert_eq!(report.total, report.embedded);

    let baggage = runtime
        .lookup("How many checked bags can I bring in economy?")
        .await
        .expect("lookup");
    assert!(!baggage.is_empty());
    assert_eq!(baggage[0].title, "Checked Baggage Allowance");

    let pets = runtime
        .lookup("Can I bring my cat on the plane?")
        .await
        .expect("lookup");
    assert!(!pets.is_empty());
    assert_eq!(pets[0].title, "Pets in the Cabin");
}
