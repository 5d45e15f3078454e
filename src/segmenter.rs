//! Document segmentation.
//!
//! Splits document text into overlapping chunks along a hierarchy of
//! separators, preferring natural boundaries (paragraph, line, sentence,
//! clause, word) and falling back to a raw character cut only when no
//! separator fits inside the size budget.

use crate::document::{Chunk, Document, META_CHUNK_INDEX};
use crate::error::{RagError, Result};

/// Separator hierarchy, coarsest first.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", " "];

/// Splits documents into overlapping, offset-tracked chunks.
///
/// Segmentation is deterministic: the same document with the same parameters
/// always yields byte-identical chunk boundaries.
///
/// # Example
///
/// ```rust,ignore
/// use esg_rag::DocumentSegmenter;
///
/// let segmenter = DocumentSegmenter::new(512, 50)?;
/// let chunks = segmenter.segment(&document)?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentSegmenter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentSegmenter {
    /// Create a new segmenter.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Segmentation`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::Segmentation(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` only when the document text is empty. Each
    /// chunk inherits the document's metadata plus a `chunk_index` field,
    /// carries exact byte offsets into the source text, and has an empty
    /// embedding vector.
    pub fn segment(&self, document: &Document) -> Result<Vec<Chunk>> {
        let text = &document.text;
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < text.len() {
            let mut end = if text.len() - start <= self.chunk_size {
                text.len()
            } else {
                let hard_end = floor_char_boundary(text, start + self.chunk_size);
                best_break(text, start, hard_end)
            };
            if end <= start {
                // chunk_size smaller than the char at `start`; take that char.
                let width = text[start..].chars().next().map_or(1, char::len_utf8);
                end = (start + width).min(text.len());
            }

            let mut metadata = document.metadata.clone();
            metadata.insert(META_CHUNK_INDEX.to_string(), index.to_string());

            chunks.push(Chunk {
                id: format!("{}_{index}", document.id),
                document_id: document.id.clone(),
                text: text[start..end].to_string(),
                start_offset: start,
                end_offset: end,
                embedding: Vec::new(),
                metadata,
            });

            if end == text.len() {
                break;
            }

            let next = floor_char_boundary(text, end.saturating_sub(self.chunk_overlap));
            // Guarantee forward progress even for pathological overlaps.
            start = if next > start { next } else { end };
            index += 1;
        }

        Ok(chunks)
    }
}

/// Find the latest natural break in `text[start..hard_end]`, trying coarser
/// separators first. The break position includes the separator, so chunk
/// boundaries never fall inside one. Falls back to `hard_end`.
fn best_break(text: &str, start: usize, hard_end: usize) -> usize {
    let window = &text[start..hard_end];
    for separator in SEPARATORS {
        if let Some(pos) = window.rfind(separator) {
            if pos > 0 {
                return start + pos + separator.len();
            }
        }
    }
    hard_end
}

/// Round `index` down to the nearest char boundary in `text`.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    fn doc(text: &str) -> Document {
        Document {
            id: "doc_1".to_string(),
            text: text.to_string(),
            source_path: PathBuf::from("doc_1.txt"),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn rejects_overlap_not_less_than_chunk_size() {
        assert!(matches!(
            DocumentSegmenter::new(100, 100),
            Err(RagError::Segmentation(_))
        ));
        assert!(matches!(
            DocumentSegmenter::new(100, 150),
            Err(RagError::Segmentation(_))
        ));
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let segmenter = DocumentSegmenter::new(100, 10).unwrap();
        assert!(segmenter.segment(&doc("")).unwrap().is_empty());
    }

    #[test]
    fn short_document_yields_single_chunk_covering_text() {
        let segmenter = DocumentSegmenter::new(100, 10).unwrap();
        let chunks = segmenter.segment(&doc("A short paragraph.")).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].end_offset, 18);
        assert_eq!(chunks[0].text, "A short paragraph.");
        assert_eq!(chunks[0].id, "doc_1_0");
    }

    #[test]
    fn chunks_respect_size_bound_and_overlap() {
        let text = "one two three four five six seven eight nine ten ".repeat(10);
        let segmenter = DocumentSegmenter::new(80, 20).unwrap();
        let chunks = segmenter.segment(&doc(&text)).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.end_offset - chunk.start_offset <= 80);
            assert_eq!(&text[chunk.start_offset..chunk.end_offset], chunk.text);
        }
        for pair in chunks.windows(2) {
            // Each chunk starts inside the previous chunk's tail.
            assert!(pair[1].start_offset < pair[0].end_offset);
            assert!(pair[1].start_offset > pair[0].start_offset);
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let text = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let segmenter = DocumentSegmenter::new(80, 10).unwrap();
        let chunks = segmenter.segment(&doc(&text)).unwrap();
        assert!(chunks[0].text.ends_with("\n\n"));
    }

    #[test]
    fn segmentation_is_deterministic() {
        let text = "Climate disclosures improved. Emissions fell by 12% year over year. \
                    The board reviewed the transition plan; milestones were met. "
            .repeat(20);
        let segmenter = DocumentSegmenter::new(256, 32).unwrap();
        let first = segmenter.segment(&doc(&text)).unwrap();
        let second = segmenter.segment(&doc(&text)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn multibyte_text_never_splits_inside_a_char() {
        let text = "émission ".repeat(50);
        let segmenter = DocumentSegmenter::new(40, 8).unwrap();
        let chunks = segmenter.segment(&doc(&text)).unwrap();
        for chunk in chunks {
            assert!(text.is_char_boundary(chunk.start_offset));
            assert!(text.is_char_boundary(chunk.end_offset));
        }
    }

    #[test]
    fn chunk_index_metadata_is_sequential() {
        let text = "word ".repeat(100);
        let segmenter = DocumentSegmenter::new(64, 16).unwrap();
        let chunks = segmenter.segment(&doc(&text)).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata[META_CHUNK_INDEX], i.to_string());
        }
    }
}
