//! Error types for the `esg-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The document source directory is missing or unreadable.
    #[error("Document source unavailable ({path:?}): {message}")]
    SourceUnavailable {
        /// The root path that could not be read.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// The document source yielded zero documents.
    #[error("No documents found to index under {0:?}")]
    NoDocuments(PathBuf),

    /// An error occurred during document segmentation.
    #[error("Segmentation error: {0}")]
    Segmentation(String),

    /// Segmentation produced zero chunks across the whole corpus.
    #[error("No chunks created from documents")]
    NoChunks,

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the language-model backend.
    #[error("Language model error ({provider}): {message}")]
    Llm {
        /// The model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The named collection does not exist in the vector store.
    #[error("Collection '{0}' does not exist")]
    CollectionNotFound(String),

    /// The collection was created with a different embedding dimensionality.
    #[error("Dimension mismatch for collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The collection whose dimensions did not match.
        collection: String,
        /// The dimensionality the collection was created with.
        expected: usize,
        /// The dimensionality requested by the caller.
        actual: usize,
    },

    /// An error reading or writing persisted state (manifest, snapshots).
    #[error("Storage error ({path:?}): {message}")]
    Storage {
        /// The path being read or written.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// The query engine was used before the index was built and loaded.
    #[error("Index not initialized. Build the index and call setup() first")]
    NotInitialized,

    /// The query text was empty or whitespace-only.
    #[error("Query must not be empty")]
    EmptyQuery,
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
