//! Embedding provider boundary.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into fixed-dimension vectors for storage and search.
///
/// The indexing pipeline embeds whole chunk batches and the query path
/// embeds single questions through the same provider, so the vectors on
/// both sides of a similarity search always come from one backend. The
/// reported [`dimensions`](EmbeddingProvider::dimensions) must match the
/// collection the vectors are upserted into.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text. The returned vector has
    /// [`dimensions`](EmbeddingProvider::dimensions) entries.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input in input order.
    ///
    /// Defaults to sequential [`embed`](EmbeddingProvider::embed) calls;
    /// backends with a native batch endpoint should override this.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimensionality of every vector this provider produces.
    fn dimensions(&self) -> usize;
}
