//! Query orchestration.
//!
//! [`RagEngine`] is the public query entry point: it wires the
//! [`Retriever`] and [`ResponseSynthesizer`] together, enforces the
//! "index must be ready" and "question must not be blank" preconditions,
//! and translates every lower-level failure into a degraded
//! [`QueryResult`] instead of letting it propagate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::{Chunk, Citation, IndexManifest, META_FILE_NAME, QueryResult, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::indexer::{IndexState, MANIFEST_FILE, SharedIndexState};
use crate::llm::LanguageModel;
use crate::retrieval::{RetrievalOptions, Retriever};
use crate::synthesis::ResponseSynthesizer;
use crate::vectorstore::{CollectionInfo, VectorStore};

/// Collection and configuration snapshot for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalStats {
    /// Collection existence and size.
    pub collection_info: CollectionInfo,
    /// The persisted index manifest, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<IndexManifest>,
    /// Echo of the active configuration.
    pub configuration: RagConfig,
}

/// The public query orchestrator.
///
/// Construct one via [`RagEngine::builder()`], sharing the index state
/// handle from the [`Indexer`](crate::Indexer) so queries wait out rebuilds
/// instead of reading a collection mid-deletion.
pub struct RagEngine {
    config: RagConfig,
    retriever: Retriever,
    synthesizer: ResponseSynthesizer,
    store: Arc<dyn VectorStore>,
    state: SharedIndexState,
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// Verify the index is queryable, marking the shared state `Ready` when
    /// a populated collection survives from an earlier run.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotInitialized`] when no populated collection
    /// exists, and [`RagError::VectorStore`] when the store is unreachable.
    pub async fn setup(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            if *state == IndexState::Ready {
                return Ok(());
            }
        }

        let info = self.store.collection_info(&self.config.collection_name).await?;
        if !info.exists || info.point_count == 0 {
            return Err(RagError::NotInitialized);
        }

        let mut state = self.state.write().await;
        if matches!(*state, IndexState::Empty | IndexState::Failed) {
            *state = IndexState::Ready;
        }
        info!(collection = %self.config.collection_name, points = info.point_count, "query engine ready");
        Ok(())
    }

    /// Answer a question over the indexed corpus.
    ///
    /// # Errors
    ///
    /// Only caller-contract violations surface as `Err`:
    /// [`RagError::EmptyQuery`] for blank questions and
    /// [`RagError::NotInitialized`] when the index is not ready. Retrieval
    /// and synthesis failures yield an `Ok` degraded result whose `answer`
    /// explains the failure and whose citation list is empty.
    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyQuery);
        }

        // Read guard: waits out an in-flight rebuild, then pins the state
        // for the duration of retrieval.
        let state = self.state.read().await;
        if *state != IndexState::Ready {
            return Err(RagError::NotInitialized);
        }

        info!(question, "processing query");
        let options = RetrievalOptions::from(&self.config);
        let context = match self.retriever.retrieve(question, &options).await {
            Ok(context) => context,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                return Ok(degraded(e));
            }
        };
        drop(state);

        if context.is_empty() {
            info!("no relevant context found");
            return Ok(QueryResult {
                answer: "The indexed documents do not contain enough information to answer \
                         this question."
                    .to_string(),
                citations: Vec::new(),
                confidence: None,
                error: None,
            });
        }

        let synthesized = match self.synthesizer.synthesize(question, &context).await {
            Ok(synthesized) => synthesized,
            Err(e) => {
                error!(error = %e, "synthesis failed");
                return Ok(degraded(e));
            }
        };

        let citations = self.citations(&context);
        info!(citations = citations.len(), "query processed");
        Ok(QueryResult {
            answer: synthesized.answer,
            citations,
            confidence: synthesized.confidence,
            error: None,
        })
    }

    /// Build display citations: up to `max_citations` context chunks in
    /// retrieval order, excerpts truncated to the configured preview length.
    fn citations(&self, context: &[SearchResult]) -> Vec<Citation> {
        context
            .iter()
            .take(self.config.max_citations)
            .map(|r| Citation {
                source: r
                    .chunk
                    .metadata
                    .get(META_FILE_NAME)
                    .cloned()
                    .unwrap_or_else(|| r.chunk.document_id.clone()),
                excerpt: truncate_chars(&r.chunk.text, self.config.citation_preview_chars),
                score: r.score,
            })
            .collect()
    }

    /// Collection info plus configuration echo for diagnostics.
    pub async fn retrieval_stats(&self) -> RetrievalStats {
        let collection_info = self
            .store
            .collection_info(&self.config.collection_name)
            .await
            .unwrap_or_default();
        let manifest = std::fs::read(self.config.index_storage_path.join(MANIFEST_FILE))
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok());
        RetrievalStats { collection_info, manifest, configuration: self.config.clone() }
    }

    /// Raw similarity search without filtering or synthesis.
    pub async fn similar_documents(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.retriever.similar_documents(query, top_k).await
    }

    /// Fetch a stored chunk by ID.
    pub async fn document_by_id(&self, id: &str) -> Result<Option<Chunk>> {
        self.store.get(&self.config.collection_name, id).await
    }
}

fn degraded(e: RagError) -> QueryResult {
    QueryResult {
        answer: format!(
            "Sorry, I encountered an error while processing your question: {e}"
        ),
        citations: Vec::new(),
        confidence: None,
        error: Some(e.to_string()),
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Builder for constructing a [`RagEngine`].
///
/// All fields are required. The state handle comes from
/// [`Indexer::state_handle`](crate::Indexer::state_handle).
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    llm: Option<Arc<dyn LanguageModel>>,
    store: Option<Arc<dyn VectorStore>>,
    state: Option<SharedIndexState>,
}

impl RagEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for query embedding.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the language model used for answer synthesis.
    pub fn llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the vector store gateway.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the shared index state handle.
    pub fn state(mut self, state: SharedIndexState) -> Self {
        self.state = Some(state);
        self
    }

    /// Build the [`RagEngine`], validating that all fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagEngine> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let llm = self.llm.ok_or_else(|| RagError::Config("llm is required".to_string()))?;
        let store = self.store.ok_or_else(|| RagError::Config("store is required".to_string()))?;
        let state = self.state.ok_or_else(|| RagError::Config("state is required".to_string()))?;

        let retriever =
            Retriever::new(Arc::clone(&embedder), Arc::clone(&store), config.collection_name.as_str());
        let synthesizer = ResponseSynthesizer::new(llm, config.temperature);

        Ok(RagEngine { config, retriever, synthesizer, store, state })
    }
}
