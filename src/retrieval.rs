//! Query-time retrieval: similarity search plus post-retrieval filters.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Per-query retrieval parameters.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOptions {
    /// Number of candidates to request from the vector store.
    pub top_k: usize,
    /// Minimum similarity score; lower-scoring candidates are dropped.
    pub similarity_cutoff: f32,
    /// When non-empty, a candidate must contain at least one of these.
    pub required_keywords: Vec<String>,
    /// A candidate containing any of these is dropped.
    pub excluded_keywords: Vec<String>,
}

impl From<&RagConfig> for RetrievalOptions {
    fn from(config: &RagConfig) -> Self {
        Self {
            top_k: config.top_k,
            similarity_cutoff: config.similarity_cutoff,
            required_keywords: config.required_keywords.clone(),
            excluded_keywords: config.excluded_keywords.clone(),
        }
    }
}

/// Retrieves relevant chunks for a query through the vector store gateway.
///
/// Pipeline: embed the query, search for `top_k` candidates, then apply the
/// similarity cutoff and keyword filters in order. Search ordering
/// (descending score) is preserved through filtering. An empty result is a
/// valid outcome — callers decide how to present "no relevant context".
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl Retriever {
    /// Create a retriever over the given collection.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self { embedder, store, collection: collection.into() }
    }

    /// Retrieve candidates for `query` and apply the post-retrieval filters.
    pub async fn retrieve(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<SearchResult>> {
        let candidates = self.similar_documents(query, options.top_k).await?;
        let candidate_count = candidates.len();

        let results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|r| r.score >= options.similarity_cutoff)
            .filter(|r| {
                passes_keyword_filters(
                    &r.chunk.text,
                    &options.required_keywords,
                    &options.excluded_keywords,
                )
            })
            .collect();

        info!(
            candidates = candidate_count,
            retained = results.len(),
            cutoff = options.similarity_cutoff,
            "retrieval completed"
        );
        Ok(results)
    }

    /// Raw similarity search without post-retrieval filtering.
    pub async fn similar_documents(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        debug!(collection = %self.collection, top_k, "embedding query");
        let query_embedding = self.embedder.embed(query).await?;
        self.store.search(&self.collection, &query_embedding, top_k).await
    }
}

/// Case-insensitive keyword filter: reject on any excluded keyword, and
/// (when the required list is non-empty) reject unless at least one
/// required keyword is present.
fn passes_keyword_filters(text: &str, required: &[String], excluded: &[String]) -> bool {
    let text = text.to_lowercase();
    if excluded.iter().any(|kw| text.contains(&kw.to_lowercase())) {
        return false;
    }
    if !required.is_empty() && !required.iter().any(|kw| text.contains(&kw.to_lowercase())) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn empty_required_list_disables_the_filter() {
        assert!(passes_keyword_filters("anything at all", &[], &[]));
    }

    #[test]
    fn required_keywords_need_one_match() {
        let required = kw(&["ESG", "sustainability"]);
        assert!(passes_keyword_filters("Our Sustainability goals", &required, &[]));
        assert!(!passes_keyword_filters("quarterly revenue report", &required, &[]));
    }

    #[test]
    fn excluded_keywords_reject_on_any_match() {
        let excluded = kw(&["irrelevant"]);
        assert!(!passes_keyword_filters("This is IRRELEVANT text", &[], &excluded));
        assert!(passes_keyword_filters("This is relevant text", &[], &excluded));
    }

    #[test]
    fn exclusion_wins_over_required_match() {
        let required = kw(&["esg"]);
        let excluded = kw(&["draft"]);
        assert!(!passes_keyword_filters("ESG report (draft)", &required, &excluded));
    }
}
