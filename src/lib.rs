//! Retrieval-Augmented Generation over an ESG document corpus.
//!
//! `esg-rag` indexes a directory of documents into a vector collection and
//! answers natural-language questions grounded in the retrieved passages,
//! with citations back to the source files.
//!
//! # Architecture
//!
//! - [`DocumentSegmenter`] — overlap-aware, boundary-preferring chunking
//! - [`enrich`] — document-type and ESG-category tagging
//! - [`VectorStore`] — gateway trait with [`InMemoryVectorStore`] and the
//!   durable [`FileVectorStore`]
//! - [`Indexer`] — build / validate / status / cleanup orchestration
//! - [`Retriever`] — similarity search plus cutoff and keyword filters
//! - [`ResponseSynthesizer`] — grounded prompt + one model completion
//! - [`RagEngine`] — the public query entry point
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use esg_rag::{
//!     DirectorySource, FileVectorStore, Indexer, RagConfig, RagEngine,
//! };
//!
//! let config = RagConfig::builder().document_path("./data/esg_documents").build()?;
//! let store = Arc::new(FileVectorStore::new(&config.vector_storage_path));
//! let source = Arc::new(DirectorySource::new(
//!     &config.document_path,
//!     config.allowed_extensions.clone(),
//! ));
//!
//! let indexer = Indexer::new(config.clone(), source, embedder.clone(), store.clone())?;
//! let report = indexer.index_documents(false).await;
//! assert!(report.success);
//!
//! let engine = RagEngine::builder()
//!     .config(config)
//!     .embedder(embedder)
//!     .llm(llm)
//!     .store(store)
//!     .state(indexer.state_handle())
//!     .build()?;
//! engine.setup().await?;
//! let result = engine.query("What are our emission reduction targets?").await?;
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod filestore;
pub mod indexer;
pub mod inmemory;
pub mod llm;
pub mod loader;
pub mod retrieval;
pub mod segmenter;
pub mod synthesis;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;

pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, Citation, Document, DocumentStats, IndexManifest, QueryResult, SearchResult,
};
pub use embedding::EmbeddingProvider;
pub use engine::{RagEngine, RagEngineBuilder, RetrievalStats};
pub use error::{RagError, Result};
pub use filestore::FileVectorStore;
pub use indexer::{
    CleanupReport, IndexReport, IndexState, IndexStatus, IndexValidation, Indexer,
    SharedIndexState,
};
pub use inmemory::InMemoryVectorStore;
pub use llm::LanguageModel;
pub use loader::{DirectorySource, DocumentSource};
pub use retrieval::{RetrievalOptions, Retriever};
pub use segmenter::DocumentSegmenter;
pub use synthesis::{ResponseSynthesizer, SynthesizedAnswer};
pub use vectorstore::{CollectionInfo, VectorStore};

#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
