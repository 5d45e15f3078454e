//! Data types for documents, chunks, search results, and reports.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata key holding the source file name.
pub const META_FILE_NAME: &str = "file_name";
/// Metadata key holding the source file type (extension).
pub const META_FILE_TYPE: &str = "file_type";
/// Metadata key holding the document type derived from the extension.
pub const META_DOCUMENT_TYPE: &str = "document_type";
/// Metadata key holding the ESG category derived from the file name.
pub const META_ESG_CATEGORY: &str = "esg_category";
/// Metadata key holding the chunk's position within its document.
pub const META_CHUNK_INDEX: &str = "chunk_index";

/// A source document containing text content and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Path to the original source file.
    pub source_path: PathBuf,
    /// Key-value metadata (`file_name`, `file_type`, ...).
    pub metadata: HashMap<String, String>,
}

/// A segment of a [`Document`] with its position and vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk (`{document_id}_{index}`).
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Byte offset of the chunk start within the document text.
    pub start_offset: usize,
    /// Byte offset of the chunk end within the document text.
    pub end_offset: usize,
    /// The vector embedding for this chunk's text. Empty until embedded.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A citation excerpt attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// The source file name of the cited chunk.
    pub source: String,
    /// A bounded preview of the cited chunk text.
    pub excerpt: String,
    /// The retrieval score of the cited chunk.
    pub score: f32,
}

/// The outcome of a single query: answer text plus grounding citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The synthesized answer text.
    pub answer: String,
    /// Citations for the context the answer was grounded in, in retrieval order.
    pub citations: Vec<Citation>,
    /// Mean retrieval score of the cited context, when any context was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// The failure message when the result is degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary statistics over a loaded document set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of documents loaded.
    pub total_documents: usize,
    /// Sum of document text lengths in bytes.
    pub total_text_length: usize,
    /// Document count per document type (extension).
    pub document_types: HashMap<String, usize>,
    /// Document count per ESG category.
    pub esg_categories: HashMap<String, usize>,
}

/// Persisted record of the last successful index build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    /// Number of documents indexed.
    pub document_count: usize,
    /// Number of chunks upserted into the collection.
    pub chunk_count: usize,
    /// Timestamp of the build.
    pub built_at: DateTime<Utc>,
    /// Identifier of the embedding model the vectors were produced with.
    pub embedding_model: String,
}
