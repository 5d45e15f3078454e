//! Configuration for the RAG engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for indexing and querying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Name of the vector store collection holding the corpus.
    pub collection_name: String,
    /// Root directory the document source reads from.
    pub document_path: PathBuf,
    /// Directory where the index manifest is persisted.
    pub index_storage_path: PathBuf,
    /// Directory where the vector store keeps its durable data.
    pub vector_storage_path: PathBuf,
    /// File extensions (without dot) accepted by the document source.
    pub allowed_extensions: Vec<String>,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top candidates to retrieve from vector search.
    pub top_k: usize,
    /// Minimum similarity score for retrieved chunks (lower scores are dropped).
    pub similarity_cutoff: f32,
    /// Keywords at least one of which must appear in a retrieved chunk.
    /// An empty list disables the filter.
    pub required_keywords: Vec<String>,
    /// Keywords that disqualify a retrieved chunk when present.
    pub excluded_keywords: Vec<String>,
    /// Identifier of the embedding model, recorded in the index manifest.
    pub embedding_model: String,
    /// Identifier of the language model used for synthesis.
    pub llm_model: String,
    /// Sampling temperature passed to the language model.
    pub temperature: f32,
    /// Maximum number of citations returned per query.
    pub max_citations: usize,
    /// Maximum length in characters of a citation excerpt.
    pub citation_preview_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection_name: "esg_documents".into(),
            document_path: PathBuf::from("./data/esg_documents"),
            index_storage_path: PathBuf::from("./storage"),
            vector_storage_path: PathBuf::from("./vector_data"),
            allowed_extensions: vec!["txt".into(), "md".into()],
            chunk_size: 512,
            chunk_overlap: 50,
            top_k: 5,
            similarity_cutoff: 0.7,
            required_keywords: Vec::new(),
            excluded_keywords: Vec::new(),
            embedding_model: "text-embedding-3-small".into(),
            llm_model: "gpt-4-turbo-preview".into(),
            temperature: 0.1,
            max_citations: 3,
            citation_preview_chars: 200,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the vector store collection name.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the document source root directory.
    pub fn document_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.document_path = path.into();
        self
    }

    /// Set the directory where the index manifest is persisted.
    pub fn index_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_storage_path = path.into();
        self
    }

    /// Set the directory where the vector store keeps durable data.
    pub fn vector_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.vector_storage_path = path.into();
        self
    }

    /// Set the file extensions accepted by the document source.
    pub fn allowed_extensions(mut self, exts: Vec<String>) -> Self {
        self.config.allowed_extensions = exts;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top candidates retrieved from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity score for retrieved chunks.
    pub fn similarity_cutoff(mut self, cutoff: f32) -> Self {
        self.config.similarity_cutoff = cutoff;
        self
    }

    /// Set the keywords at least one of which must appear in retrieved chunks.
    pub fn required_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.required_keywords = keywords;
        self
    }

    /// Set the keywords that disqualify retrieved chunks.
    pub fn excluded_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.excluded_keywords = keywords;
        self
    }

    /// Set the embedding model identifier recorded in the manifest.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the language model identifier used for synthesis.
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.config.llm_model = model.into();
        self
    }

    /// Set the sampling temperature passed to the language model.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the maximum number of citations returned per query.
    pub fn max_citations(mut self, n: usize) -> Self {
        self.config.max_citations = n;
        self
    }

    /// Set the maximum citation excerpt length in characters.
    pub fn citation_preview_chars(mut self, n: usize) -> Self {
        self.config.citation_preview_chars = n;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `similarity_cutoff` is outside `[0.0, 1.0]`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.config.similarity_cutoff) {
            return Err(RagError::Config(format!(
                "similarity_cutoff ({}) must be between 0.0 and 1.0",
                self.config.similarity_cutoff
            )));
        }
        Ok(self.config)
    }
}
