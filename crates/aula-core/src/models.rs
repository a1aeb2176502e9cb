//! Core data types shared by the chunker, the index, and the application.

use serde::{Deserialize, Serialize};

/// One retrievable piece of a source document's cleaned text.
///
/// Produced by [`chunk_text`](crate::chunk::chunk_text). The `id` is
/// `"{document}_{chunk_index}"`, so it is stable across re-processing of the
/// same document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    /// Cleaned, non-tokenized text. Never empty after trimming.
    pub content: String,
    /// Display name of the owning document (the uploaded file name).
    pub document: String,
    /// Zero-based position within the document, in emission order.
    pub chunk_index: usize,
    /// Cached output of [`tokenize`](crate::tokenize::tokenize) for `content`.
    ///
    /// `None` until computed; the index fills it on insert or lazily on the
    /// first search that touches the fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_tokens: Option<Vec<String>>,
}

impl Fragment {
    pub fn new(document: &str, chunk_index: usize, content: &str) -> Self {
        Self {
            id: format!("{}_{}", document, chunk_index),
            content: content.to_string(),
            document: document.to_string(),
            chunk_index,
            processed_tokens: None,
        }
    }
}

/// A fragment returned from [`DocumentIndex::search`](crate::index::DocumentIndex::search),
/// with its relevance score in `(0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    #[serde(flatten)]
    pub fragment: Fragment,
    pub score: f64,
}

/// Per-document listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    /// Number of fragments currently indexed for this document.
    pub fragments: usize,
    /// When the document was processed, if the application knows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
}
