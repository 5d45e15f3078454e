//! Document source boundary.
//!
//! The core pipeline only needs text plus filename metadata per document;
//! binary format parsing (PDF, DOCX) lives behind the [`DocumentSource`]
//! trait and is not implemented here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::document::{Document, META_FILE_NAME, META_FILE_TYPE};
use crate::error::{RagError, Result};

/// A provider of documents to index.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// List every available document with its text content and metadata.
    async fn list_documents(&self) -> Result<Vec<Document>>;
}

/// A [`DocumentSource`] reading UTF-8 text files from a directory tree.
///
/// Files are discovered in sorted path order so repeated loads yield
/// documents in a stable order. The path relative to the root is used as
/// the document ID, so files with the same name in different
/// subdirectories stay distinct.
///
/// # Example
///
/// ```rust,ignore
/// use esg_rag::DirectorySource;
///
/// let source = DirectorySource::new("./data/esg_documents", vec!["txt".into(), "md".into()]);
/// let documents = source.list_documents().await?;
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    recursive: bool,
    allowed_extensions: Vec<String>,
}

impl DirectorySource {
    /// Create a source reading recursively from `root`, accepting the given
    /// file extensions (without the leading dot).
    pub fn new(root: impl Into<PathBuf>, allowed_extensions: Vec<String>) -> Self {
        Self { root: root.into(), recursive: true, allowed_extensions }
    }

    /// Restrict discovery to the root directory itself.
    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    /// The root directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext))
            })
    }

    /// Discover matching files under the root, sorted by path.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(RagError::SourceUnavailable {
                path: self.root.clone(),
                message: "directory does not exist".to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = WalkDir::new(&self.root)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.accepts(entry.path()))
            .map(|entry| entry.into_path())
            .collect::<Vec<_>>();

        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        let files = self.discover_files()?;
        debug!(root = %self.root.display(), file_count = files.len(), "discovered source files");

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let text = std::fs::read_to_string(&path).map_err(|e| RagError::SourceUnavailable {
                path: path.clone(),
                message: format!("failed to read file: {e}"),
            })?;

            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let file_type = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_lowercase())
                .unwrap_or_else(|| "unknown".to_string());

            let id = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            let mut metadata = HashMap::new();
            metadata.insert(META_FILE_NAME.to_string(), file_name);
            metadata.insert(META_FILE_TYPE.to_string(), file_type);

            documents.push(Document { id, text, source_path: path, metadata });
        }

        info!(root = %self.root.display(), document_count = documents.len(), "loaded documents");
        Ok(documents)
    }
}
