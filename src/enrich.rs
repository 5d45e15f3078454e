//! Chunk metadata enrichment.
//!
//! Pure functions that tag chunks with a `document_type` (from the source
//! file extension) and an `esg_category` (from a filename keyword policy).
//! The categorization is filename-based, not content-based — a known
//! limitation carried over from the source system.

use std::path::Path;

use crate::document::{Chunk, META_DOCUMENT_TYPE, META_ESG_CATEGORY, META_FILE_NAME};

const ENVIRONMENTAL_KEYWORDS: &[&str] = &["carbon", "climate", "emission"];
const SOCIAL_KEYWORDS: &[&str] = &["social", "human", "labor", "community"];
const GOVERNANCE_KEYWORDS: &[&str] = &["governance", "board", "compliance", "risk"];

/// Tag a chunk with `document_type` and `esg_category` metadata derived
/// from its `file_name` metadata. Chunks without a file name are tagged
/// `unknown` / `general`.
pub fn enrich(mut chunk: Chunk) -> Chunk {
    let file_name = chunk.metadata.get(META_FILE_NAME).cloned().unwrap_or_default();
    chunk
        .metadata
        .insert(META_DOCUMENT_TYPE.to_string(), document_type(&file_name));
    chunk
        .metadata
        .insert(META_ESG_CATEGORY.to_string(), esg_category(&file_name).to_string());
    chunk
}

/// Derive the document type from a file name's extension, lowercased.
/// Returns `"unknown"` when there is no extension.
pub fn document_type(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Classify a file name into an ESG category.
///
/// Keyword groups are checked in fixed priority order: environmental,
/// then social, then governance. A file name matching none is `general`.
pub fn esg_category(file_name: &str) -> &'static str {
    let name = file_name.to_lowercase();
    if ENVIRONMENTAL_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        "environmental"
    } else if SOCIAL_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        "social"
    } else if GOVERNANCE_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        "governance"
    } else {
        "general"
    }
}
