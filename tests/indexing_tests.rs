//! Integration tests for the indexing orchestrator: builds, validation,
//! status, cleanup, and failure isolation.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::{FailingEmbedder, HashEmbedder, SlowEmbedder, write_corpus};
use esg_rag::{
    DirectorySource, EmbeddingProvider, FileVectorStore, IndexState, Indexer, RagConfig,
    VectorStore,
};

const DIMS: usize = 16;

fn test_config(root: &Path) -> RagConfig {
    RagConfig::builder()
        .collection_name("esg_test")
        .document_path(root.join("docs"))
        .index_storage_path(root.join("storage"))
        .vector_storage_path(root.join("vector_data"))
        .chunk_size(512)
        .chunk_overlap(50)
        .similarity_cutoff(0.0)
        .build()
        .unwrap()
}

fn indexer_with(
    config: &RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
) -> Indexer {
    let source = Arc::new(DirectorySource::new(
        &config.document_path,
        config.allowed_extensions.clone(),
    ));
    Indexer::new(config.clone(), source, embedder, store).unwrap()
}

#[tokio::test]
async fn build_reports_statistics_and_reaches_ready() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    write_corpus(&config.document_path);

    let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store.clone());

    let report = indexer.index_documents(false).await;
    assert!(report.success, "build failed: {:?}", report.error);
    assert_eq!(report.documents_processed, 3);
    assert!(report.nodes_created > 0);
    assert_eq!(report.collection_points, report.nodes_created);
    assert!(report.processing_time_seconds >= 0.0);

    let stats = report.document_stats.unwrap();
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.esg_categories["environmental"], 1);
    assert_eq!(stats.esg_categories["social"], 1);
    assert_eq!(stats.esg_categories["governance"], 1);

    assert_eq!(indexer.state().await, IndexState::Ready);

    let manifest = indexer.load_manifest().unwrap().unwrap();
    assert_eq!(manifest.document_count, 3);
    assert_eq!(manifest.chunk_count, report.nodes_created);
    assert_eq!(manifest.embedding_model, config.embedding_model);

    let validation = indexer.validate_index().await;
    assert!(validation.valid);
    assert!(validation.canary_search_ok);
    assert_eq!(validation.collection_info.point_count, report.nodes_created);
}

#[tokio::test]
async fn persisted_index_reloads_with_the_same_point_count() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    write_corpus(&config.document_path);

    let nodes_created = {
        let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
        let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store);
        let report = indexer.index_documents(false).await;
        assert!(report.success);
        report.nodes_created
    };

    // A fresh store over the same path sees every persisted point.
    let reopened = FileVectorStore::new(&config.vector_storage_path);
    let info = reopened.collection_info("esg_test").await.unwrap();
    assert!(info.exists);
    assert_eq!(info.point_count, nodes_created);
}

#[tokio::test]
async fn empty_document_directory_aborts_cleanly() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    std::fs::create_dir_all(&config.document_path).unwrap();

    let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store);

    let report = indexer.index_documents(false).await;
    assert!(!report.success);
    assert!(report.error.unwrap().contains("No documents"));
    assert_ne!(indexer.state().await, IndexState::Ready);
}

#[tokio::test]
async fn missing_document_directory_is_reported_not_thrown() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());

    let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store);

    let report = indexer.index_documents(false).await;
    assert!(!report.success);
    assert!(report.error.unwrap().contains("unavailable"));
}

#[tokio::test]
async fn failed_force_rebuild_leaves_no_phantom_collection() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    write_corpus(&config.document_path);

    let store: Arc<dyn VectorStore> =
        Arc::new(FileVectorStore::new(&config.vector_storage_path));

    // First build succeeds.
    let good = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store.clone());
    assert!(good.index_documents(false).await.success);

    // Forced rebuild with a broken embedding backend deletes the old
    // collection and must not leave a half-populated replacement behind.
    let broken = indexer_with(&config, Arc::new(FailingEmbedder::new(DIMS)), store.clone());
    let report = broken.index_documents(true).await;
    assert!(!report.success);

    assert!(!store.collection_info("esg_test").await.unwrap().exists);
    let validation = good.validate_index().await;
    assert!(!validation.valid);
}

#[tokio::test]
async fn failed_plain_rebuild_keeps_previous_collection_intact() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    write_corpus(&config.document_path);

    let store: Arc<dyn VectorStore> =
        Arc::new(FileVectorStore::new(&config.vector_storage_path));

    let good = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store.clone());
    let first = good.index_documents(false).await;
    assert!(first.success);

    let broken = indexer_with(&config, Arc::new(FailingEmbedder::new(DIMS)), store.clone());
    let report = broken.index_documents(false).await;
    assert!(!report.success);

    // Nothing was upserted before the failure point.
    let info = store.collection_info("esg_test").await.unwrap();
    assert!(info.exists);
    assert_eq!(info.point_count, first.nodes_created);
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    write_corpus(&config.document_path);

    let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store.clone());
    assert!(indexer.index_documents(false).await.success);

    let first = indexer.cleanup_index().await;
    assert!(first.success, "issues: {:?}", first.issues);
    assert!(!config.index_storage_path.exists());
    assert!(!config.vector_storage_path.exists());
    assert_eq!(indexer.state().await, IndexState::Empty);

    let second = indexer.cleanup_index().await;
    assert!(second.success, "issues: {:?}", second.issues);
}

#[tokio::test]
async fn status_waits_out_a_force_rebuild() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    write_corpus(&config.document_path);

    let store: Arc<dyn VectorStore> =
        Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let embedder = Arc::new(SlowEmbedder::new(DIMS, Duration::from_millis(400)));
    let indexer = Arc::new(indexer_with(&config, embedder, store));
    assert!(indexer.index_documents(false).await.success);

    let rebuild = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move { indexer.index_documents(true).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The forced rebuild has deleted the collection and is stalled in
    // embedding; a health check must not transiently report it missing.
    let status = indexer.status().await;
    assert!(status.collection.exists);

    let report = rebuild.await.unwrap();
    assert!(report.success);
    assert_eq!(status.collection.point_count, report.nodes_created);
}

#[tokio::test]
async fn status_tolerates_missing_everything() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());

    let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store);

    let status = indexer.status().await;
    assert!(!status.document_directory.exists);
    assert_eq!(status.document_directory.file_count, 0);
    assert!(!status.collection.exists);
    assert!(!status.storage.index_path_exists);
    assert!(!status.storage.vector_path_exists);
    assert_eq!(status.configuration.collection_name, "esg_test");
}

#[tokio::test]
async fn status_reports_files_and_points_after_a_build() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    write_corpus(&config.document_path);

    let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store);
    let report = indexer.index_documents(false).await;
    assert!(report.success);

    let status = indexer.status().await;
    assert!(status.document_directory.exists);
    assert_eq!(status.document_directory.file_count, 3);
    assert_eq!(status.document_directory.files.len(), 3);
    assert!(status.collection.exists);
    assert_eq!(status.collection.point_count, report.nodes_created);
    assert!(status.storage.index_path_exists);
    assert!(status.storage.vector_path_exists);

    // The status payload is the health-check surface; it must serialize.
    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("esg_test"));
}

#[tokio::test]
async fn validate_reports_invalid_before_any_build() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());

    let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
    let indexer = indexer_with(&config, Arc::new(HashEmbedder::new(DIMS)), store);

    let validation = indexer.validate_index().await;
    assert!(!validation.valid);
    assert!(!validation.collection_info.exists);
    assert_eq!(validation.error.as_deref(), Some("No collection found"));
}
