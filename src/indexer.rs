//! Index build orchestration.
//!
//! The [`Indexer`] drives the full pipeline: load documents → segment →
//! enrich → embed → upsert → persist the index manifest. It owns the index
//! state machine (`Empty → Building → Ready`, `Building → Failed` on error,
//! teardown back to `Empty`) and the exclusive build lease: a build holds
//! the state write lock for its whole duration, so concurrent rebuilds
//! serialize and readers never observe a collection mid-deletion.
//!
//! Build, validation, and cleanup translate every lower-level error into a
//! structured report; nothing from this module's public surface returns a
//! bare `Err` past the orchestration boundary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::document::{
    Chunk, Document, DocumentStats, IndexManifest, META_FILE_NAME,
};
use crate::embedding::EmbeddingProvider;
use crate::enrich;
use crate::error::{RagError, Result};
use crate::loader::{DirectorySource, DocumentSource};
use crate::segmenter::DocumentSegmenter;
use crate::vectorstore::{CollectionInfo, VectorStore};

/// Fixed query used by [`Indexer::validate_index`] to confirm that the
/// embedding pipeline and the vector store agree end to end.
pub const CANARY_QUERY: &str = "ESG sustainability";

pub(crate) const MANIFEST_FILE: &str = "manifest.json";
const STATUS_FILE_SAMPLE: usize = 10;

/// Lifecycle state of the logical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexState {
    /// No index has been built (or it was torn down).
    Empty,
    /// A build is in progress.
    Building,
    /// The index is built and queryable.
    Ready,
    /// The last build failed; collapses to `Empty` on the next build or
    /// cleanup.
    Failed,
}

/// Shared, lockable index state. Builds take the write guard; queries and
/// validation take read guards.
pub type SharedIndexState = Arc<RwLock<IndexState>>;

/// Outcome of one [`Indexer::index_documents`] run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    /// Whether the build completed.
    pub success: bool,
    /// Number of documents processed.
    pub documents_processed: usize,
    /// Number of chunks created and upserted.
    pub nodes_created: usize,
    /// Statistics over the loaded documents, when loading succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_stats: Option<DocumentStats>,
    /// Point count reported by the collection after the build.
    pub collection_points: usize,
    /// Wall-clock build duration in seconds.
    pub processing_time_seconds: f64,
    /// Where the index manifest is persisted.
    pub index_path: PathBuf,
    /// Where the vector store keeps its durable data.
    pub vector_path: PathBuf,
    /// The original error message when the build failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of [`Indexer::validate_index`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexValidation {
    /// Whether the index is present and answers a canary search.
    pub valid: bool,
    /// Collection existence and size.
    pub collection_info: CollectionInfo,
    /// The persisted manifest, when readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<IndexManifest>,
    /// Whether the canary similarity search succeeded.
    pub canary_search_ok: bool,
    /// Why validation failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Existence and contents summary of the document directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryStatus {
    /// The configured document directory.
    pub path: PathBuf,
    /// Whether the directory exists.
    pub exists: bool,
    /// Number of indexable files found.
    pub file_count: usize,
    /// Names of the first few indexable files.
    pub files: Vec<String>,
}

/// Existence of the persisted storage paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStatus {
    /// The index manifest directory.
    pub index_path: PathBuf,
    /// Whether the index manifest directory exists.
    pub index_path_exists: bool,
    /// The vector store data directory.
    pub vector_path: PathBuf,
    /// Whether the vector store data directory exists.
    pub vector_path_exists: bool,
}

/// Read-only snapshot of the indexing system, suitable as a health-check
/// payload. Recomputed on every call, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Document directory existence and sample contents.
    pub document_directory: DirectoryStatus,
    /// Collection existence and point count.
    pub collection: CollectionInfo,
    /// Storage path existence.
    pub storage: StorageStatus,
    /// Echo of the active configuration.
    pub configuration: RagConfig,
}

/// Outcome of [`Indexer::cleanup_index`]. Cleanup is best-effort: every
/// issue encountered is reported, and the run keeps going past failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Whether every cleanup step succeeded.
    pub success: bool,
    /// One message per failed step.
    pub issues: Vec<String>,
}

/// Orchestrates index builds, validation, status reporting, and teardown.
pub struct Indexer {
    config: RagConfig,
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    segmenter: DocumentSegmenter,
    state: SharedIndexState,
}

impl Indexer {
    /// Create an indexer over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Segmentation`] if the configured chunk overlap is
    /// not smaller than the chunk size.
    pub fn new(
        config: RagConfig,
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let segmenter = DocumentSegmenter::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            config,
            source,
            embedder,
            store,
            segmenter,
            state: Arc::new(RwLock::new(IndexState::Empty)),
        })
    }

    /// The shared index state, for wiring into a query engine.
    pub fn state_handle(&self) -> SharedIndexState {
        Arc::clone(&self.state)
    }

    /// The current index state.
    pub async fn state(&self) -> IndexState {
        *self.state.read().await
    }

    /// The active configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Run the full indexing pipeline.
    ///
    /// With `force_rebuild`, the existing collection is deleted first and a
    /// failed run leaves it absent rather than half-populated. Without it, a
    /// failure aborts before any upsert, leaving previous data untouched.
    ///
    /// Never returns an error: failures are reported through
    /// [`IndexReport::error`].
    pub async fn index_documents(&self, force_rebuild: bool) -> IndexReport {
        let started = Instant::now();
        // Exclusive build lease for the whole run.
        let mut state = self.state.write().await;
        *state = IndexState::Building;
        info!(collection = %self.config.collection_name, force_rebuild, "starting index build");

        match self.run_build(force_rebuild).await {
            Ok(report) => {
                *state = IndexState::Ready;
                info!(
                    documents = report.documents_processed,
                    nodes = report.nodes_created,
                    elapsed = started.elapsed().as_secs_f64(),
                    "index build completed"
                );
                IndexReport {
                    processing_time_seconds: started.elapsed().as_secs_f64(),
                    ..report
                }
            }
            Err(e) => {
                error!(error = %e, "index build failed");
                if force_rebuild {
                    // A forced rebuild already deleted the old data; leave the
                    // collection absent rather than half-populated.
                    if let Err(cleanup_err) =
                        self.store.delete_collection(&self.config.collection_name).await
                    {
                        warn!(error = %cleanup_err, "failed to remove partial collection");
                    }
                }
                *state = IndexState::Failed;
                IndexReport {
                    success: false,
                    documents_processed: 0,
                    nodes_created: 0,
                    document_stats: None,
                    collection_points: 0,
                    processing_time_seconds: started.elapsed().as_secs_f64(),
                    index_path: self.config.index_storage_path.clone(),
                    vector_path: self.config.vector_storage_path.clone(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn run_build(&self, force_rebuild: bool) -> Result<IndexReport> {
        let collection = &self.config.collection_name;

        if force_rebuild {
            info!(collection = %collection, "force rebuild requested, deleting existing collection");
            self.store.delete_collection(collection).await?;
        }
        self.store.create_collection(collection, self.embedder.dimensions()).await?;

        let documents = self.source.list_documents().await?;
        if documents.is_empty() {
            return Err(RagError::NoDocuments(self.config.document_path.clone()));
        }
        let stats = document_stats(&documents);
        info!(
            documents = stats.total_documents,
            text_bytes = stats.total_text_length,
            "loaded documents"
        );

        let mut chunks: Vec<Chunk> = Vec::new();
        for document in &documents {
            for chunk in self.segmenter.segment(document)? {
                chunks.push(enrich::enrich(chunk));
            }
        }
        if chunks.is_empty() {
            return Err(RagError::NoChunks);
        }
        info!(nodes = chunks.len(), "segmented and enriched documents");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: "batch".to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.store.upsert(collection, &chunks).await?;

        let manifest = IndexManifest {
            document_count: documents.len(),
            chunk_count: chunks.len(),
            built_at: Utc::now(),
            embedding_model: self.config.embedding_model.clone(),
        };
        self.persist_manifest(&manifest)?;

        let info = self.store.collection_info(collection).await?;

        Ok(IndexReport {
            success: true,
            documents_processed: documents.len(),
            nodes_created: chunks.len(),
            document_stats: Some(stats),
            collection_points: info.point_count,
            processing_time_seconds: 0.0,
            index_path: self.config.index_storage_path.clone(),
            vector_path: self.config.vector_storage_path.clone(),
            error: None,
        })
    }

    /// Check that the collection exists, the manifest loads, and a canary
    /// similarity search runs cleanly through embedding and the store.
    pub async fn validate_index(&self) -> IndexValidation {
        let _guard = self.state.read().await;

        let collection_info = match self.store.collection_info(&self.config.collection_name).await
        {
            Ok(info) => info,
            Err(e) => {
                return IndexValidation {
                    valid: false,
                    collection_info: CollectionInfo::default(),
                    manifest: None,
                    canary_search_ok: false,
                    error: Some(e.to_string()),
                };
            }
        };

        if !collection_info.exists {
            return IndexValidation {
                valid: false,
                collection_info,
                manifest: None,
                canary_search_ok: false,
                error: Some("No collection found".to_string()),
            };
        }

        let manifest = self.load_manifest().ok().flatten();

        let canary = self.canary_search().await;
        let canary_search_ok = canary.is_ok();
        let error = canary.err().map(|e| e.to_string());

        IndexValidation {
            valid: canary_search_ok,
            collection_info,
            manifest,
            canary_search_ok,
            error,
        }
    }

    async fn canary_search(&self) -> Result<()> {
        let embedding = self.embedder.embed(CANARY_QUERY).await?;
        self.store.search(&self.config.collection_name, &embedding, 1).await?;
        Ok(())
    }

    /// Read-only aggregation of the indexing system's health. Tolerates a
    /// missing document directory, collection, or storage path by reporting
    /// absence, never by failing. Taken under the state read guard, so a
    /// health check issued during a rebuild waits for it and reports the
    /// post-build collection.
    pub async fn status(&self) -> IndexStatus {
        let _guard = self.state.read().await;
        let doc_path = &self.config.document_path;
        let discovered = DirectorySource::new(doc_path, self.config.allowed_extensions.clone())
            .discover_files()
            .unwrap_or_default();
        let files = discovered
            .iter()
            .take(STATUS_FILE_SAMPLE)
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();

        let collection = self
            .store
            .collection_info(&self.config.collection_name)
            .await
            .unwrap_or_default();

        IndexStatus {
            document_directory: DirectoryStatus {
                path: doc_path.clone(),
                exists: doc_path.is_dir(),
                file_count: discovered.len(),
                files,
            },
            collection,
            storage: StorageStatus {
                index_path: self.config.index_storage_path.clone(),
                index_path_exists: self.config.index_storage_path.is_dir(),
                vector_path: self.config.vector_storage_path.clone(),
                vector_path_exists: self.config.vector_storage_path.is_dir(),
            },
            configuration: self.config.clone(),
        }
    }

    /// Delete the collection and remove both storage paths. Best-effort:
    /// storage removal is attempted even when the store call fails, and
    /// every issue is reported. Idempotent — a second call succeeds with no
    /// issues.
    pub async fn cleanup_index(&self) -> CleanupReport {
        let mut state = self.state.write().await;
        let mut issues = Vec::new();

        if let Err(e) = self.store.delete_collection(&self.config.collection_name).await {
            issues.push(format!("failed to delete collection: {e}"));
        }

        for path in [&self.config.index_storage_path, &self.config.vector_storage_path] {
            match std::fs::remove_dir_all(path) {
                Ok(()) => info!(path = %path.display(), "removed storage directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => issues.push(format!("failed to remove {}: {e}", path.display())),
            }
        }

        *state = IndexState::Empty;
        for issue in &issues {
            warn!(issue = %issue, "cleanup issue");
        }
        CleanupReport { success: issues.is_empty(), issues }
    }

    fn manifest_path(&self) -> PathBuf {
        self.config.index_storage_path.join(MANIFEST_FILE)
    }

    fn persist_manifest(&self, manifest: &IndexManifest) -> Result<()> {
        let dir = &self.config.index_storage_path;
        std::fs::create_dir_all(dir).map_err(|e| RagError::Storage {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        let path = self.manifest_path();
        let bytes = serde_json::to_vec_pretty(manifest).map_err(|e| RagError::Storage {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, bytes).map_err(|e| RagError::Storage {
            path,
            message: e.to_string(),
        })
    }

    /// Load the persisted manifest, `Ok(None)` when absent.
    pub fn load_manifest(&self) -> Result<Option<IndexManifest>> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(|e| RagError::Storage {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| RagError::Storage { path, message: e.to_string() })
    }
}

/// Compute corpus statistics: totals plus per-type and per-category counts.
fn document_stats(documents: &[Document]) -> DocumentStats {
    let mut stats = DocumentStats {
        total_documents: documents.len(),
        total_text_length: documents.iter().map(|d| d.text.len()).sum(),
        ..DocumentStats::default()
    };
    for document in documents {
        let file_name = document.metadata.get(META_FILE_NAME).cloned().unwrap_or_default();
        *stats
            .document_types
            .entry(enrich::document_type(&file_name))
            .or_insert(0) += 1;
        *stats
            .esg_categories
            .entry(enrich::esg_category(&file_name).to_string())
            .or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn document_stats_counts_types_and_categories() {
        let docs = vec![
            doc("carbon_2023.txt"),
            doc("board_minutes.md"),
            doc("overview.txt"),
        ];
        let stats = document_stats(&docs);
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.document_types["txt"], 2);
        assert_eq!(stats.document_types["md"], 1);
        assert_eq!(stats.esg_categories["environmental"], 1);
        assert_eq!(stats.esg_categories["governance"], 1);
        assert_eq!(stats.esg_categories["general"], 1);
    }

    fn doc(name: &str) -> Document {
        let mut metadata = HashMap::new();
        metadata.insert(META_FILE_NAME.to_string(), name.to_string());
        Document {
            id: name.to_string(),
            text: "text".to_string(),
            source_path: PathBuf::from(name),
            metadata,
        }
    }
}
