//! Durable vector store backed by JSON snapshots.
//!
//! [`FileVectorStore`] keeps one snapshot file per collection under a
//! storage root (`{root}/{collection}.json`). Collections are loaded on
//! first touch after a restart and rewritten atomically (temp file +
//! rename) on every mutation, so an interrupted write never corrupts the
//! previous snapshot. Search semantics match
//! [`InMemoryVectorStore`](crate::InMemoryVectorStore).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::inmemory::{Collection, search_collection};
use crate::vectorstore::{CollectionInfo, VectorStore};

/// A [`VectorStore`] persisting collections as JSON snapshots on disk.
///
/// # Example
///
/// ```rust,ignore
/// use esg_rag::FileVectorStore;
///
/// let store = FileVectorStore::new("./vector_data");
/// store.create_collection("esg_documents", 384).await?;
/// ```
#[derive(Debug)]
pub struct FileVectorStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

impl FileVectorStore {
    /// Create a store persisting under the given root directory. The
    /// directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), collections: RwLock::new(HashMap::new()) }
    }

    /// The storage root this store persists under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_err(&self, path: &Path, e: impl std::fmt::Display) -> RagError {
        RagError::VectorStore {
            backend: "file".to_string(),
            message: format!("{}: {e}", path.display()),
        }
    }

    fn snapshot_path(&self, name: &str) -> Result<PathBuf> {
        // Collection names become file names; reject anything that could
        // escape the storage root.
        if name.is_empty() || name.contains(['/', '\\', '.']) {
            return Err(RagError::VectorStore {
                backend: "file".to_string(),
                message: format!("invalid collection name '{name}'"),
            });
        }
        Ok(self.root.join(format!("{name}.json")))
    }

    /// Populate the cache for `name` from its snapshot file, if one exists.
    async fn ensure_loaded(&self, name: &str) -> Result<()> {
        {
            let collections = self.collections.read().await;
            if collections.contains_key(name) {
                return Ok(());
            }
        }

        let path = self.snapshot_path(name)?;
        if !path.is_file() {
            return Ok(());
        }

        let bytes = std::fs::read(&path).map_err(|e| self.io_err(&path, e))?;
        let collection: Collection =
            serde_json::from_slice(&bytes).map_err(|e| self.io_err(&path, e))?;

        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_insert(collection);
        debug!(collection = name, "loaded collection snapshot");
        Ok(())
    }

    /// Write the collection snapshot atomically: serialize to a temp file in
    /// the same directory, then rename over the final path.
    fn persist(&self, name: &str, collection: &Collection) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| self.io_err(&self.root, e))?;
        let path = self.snapshot_path(name)?;
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec(collection).map_err(|e| self.io_err(&path, e))?;
        std::fs::write(&tmp, bytes).map_err(|e| self.io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| self.io_err(&path, e))?;

        debug!(collection = name, points = collection.points.len(), "persisted collection snapshot");
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.ensure_loaded(name).await?;
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            if existing.dimensions != dimensions {
                return Err(RagError::DimensionMismatch {
                    collection: name.to_string(),
                    expected: existing.dimensions,
                    actual: dimensions,
                });
            }
            return Ok(());
        }
        let collection = Collection { dimensions, points: HashMap::new() };
        self.persist(name, &collection)?;
        collections.insert(name.to_string(), collection);
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        let path = self.snapshot_path(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(&path, e)),
        }
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        self.ensure_loaded(collection).await?;
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
        for chunk in chunks {
            store.points.insert(chunk.id.clone(), chunk.clone());
        }
        self.persist(collection, store)
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.ensure_loaded(collection).await?;
        let collections = self.collections.read().await;
        let store = collections
            .get(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
        Ok(search_collection(store, embedding, top_k))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Chunk>> {
        self.ensure_loaded(collection).await?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|store| {
            store.points.get(id).map(|chunk| {
                let mut chunk = chunk.clone();
                chunk.embedding = Vec::new();
                chunk
            })
        }))
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        self.ensure_loaded(name).await?;
        let collections = self.collections.read().await;
        Ok(match collections.get(name) {
            Some(store) => CollectionInfo {
                exists: true,
                point_count: store.points.len(),
                dimensions: store.dimensions,
            },
            None => CollectionInfo::default(),
        })
    }
}
