use serde::Serialize;
use sha2::{Digest, Sha256};

/// Which loader produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Code,
    Text,
    Pdf,
}

/// Metadata attached to every emitted chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    /// Originating file path.
    pub source: String,
    /// Position of the chunk within its file's chunk sequence.
    pub index: usize,
    pub kind: DocKind,
    /// Grammar id used for code documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Page number (1-based) for PDF documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// SHA-256 of the whole source file, hex encoded. Equal across all
    /// chunks of one file, so consumers can skip re-embedding unchanged files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl DocumentMetadata {
    pub fn new(source: impl Into<String>, kind: DocKind) -> Self {
        Self {
            source: source.into(),
            index: 0,
            kind,
            language: None,
            page: None,
            content_hash: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

/// SHA-256 of raw file bytes, hex encoded.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// A chunk of text wrapped with its source metadata, ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Wrap an ordered chunk sequence, numbering chunks from `first_index`.
    #[must_use]
    pub fn wrap_all(
        chunks: Vec<String>,
        metadata: &DocumentMetadata,
        first_index: usize,
    ) -> Vec<Self> {
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, page_content)| Self {
                page_content,
                metadata: DocumentMetadata {
                    index: first_index + i,
                    ..metadata.clone()
                },
            })
            .collect()
    }
}
