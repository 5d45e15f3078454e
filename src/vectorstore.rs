//! Vector store gateway trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A snapshot of a collection's existence and size.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectionInfo {
    /// Whether the collection exists.
    pub exists: bool,
    /// Number of points stored in the collection.
    pub point_count: usize,
    /// Embedding dimensionality the collection was created with.
    pub dimensions: usize,
}

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`Chunk`]s. Operations are
/// idempotent where documented, and absence is reported through return
/// values ([`CollectionInfo::exists`], `Ok(None)`) or the typed
/// [`CollectionNotFound`](crate::RagError::CollectionNotFound) error —
/// never through a panic.
///
/// # Example
///
/// ```rust,ignore
/// use esg_rag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384).await?;
/// store.upsert("docs", &chunks).await?;
/// let results = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with the given embedding dimensionality.
    ///
    /// No-op if the collection already exists with matching dimensions;
    /// returns [`DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// if it exists with different dimensions.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data. No-op if absent.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert-or-replace chunks by ID. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Results are ordered by descending similarity score; ties are broken
    /// by ascending chunk ID for determinism. Returned chunks carry text and
    /// metadata but no embedding.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Fetch a stored chunk by ID. `Ok(None)` when the point or the
    /// collection is absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Chunk>>;

    /// Report a collection's existence and point count. Never errors on
    /// absence alone.
    async fn collection_info(&self, name: &str) -> Result<CollectionInfo>;
}
