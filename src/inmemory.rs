//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development and testing; durable storage is provided by
//! [`FileVectorStore`](crate::FileVectorStore).

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionInfo, VectorStore};

/// A named set of points with a fixed embedding dimensionality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub(crate) dimensions: usize,
    pub(crate) points: HashMap<String, Chunk>,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score every point in a collection against the query embedding and return
/// the `top_k` best, ordered by descending score with ties broken by
/// ascending chunk ID. Returned chunks carry no embedding.
pub(crate) fn search_collection(
    collection: &Collection,
    embedding: &[f32],
    top_k: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = collection
        .points
        .values()
        .map(|chunk| {
            let score = cosine_similarity(&chunk.embedding, embedding);
            let mut chunk = chunk.clone();
            chunk.embedding = Vec::new();
            SearchResult { chunk, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
    scored.truncate(top_k);
    scored
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as nested `HashMap`s: collection name → chunk ID
/// → chunk. All operations are async-safe via `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
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
        collections.insert(name.to_string(), Collection { dimensions, points: HashMap::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
        for chunk in chunks {
            store.points.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections
            .get(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
        Ok(search_collection(store, embedding, top_k))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Chunk>> {
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
