//! Sentence-accumulating text chunker with word overlap.
//!
//! Splits a document's cleaned text into [`Fragment`]s of roughly
//! `target_size` characters. Consecutive fragments share a few trailing
//! words so that context is not lost at a boundary.
//!
//! # Algorithm
//!
//! 1. Split the text on the literal `". "`. This is a naive splitter: it
//!    does not know about abbreviations or non-Latin punctuation.
//! 2. Append each segment plus `". "` to a buffer while
//!    `buffer + segment` stays strictly below `target_size` characters.
//! 3. Otherwise flush the buffer (if non-blank) as a fragment and start a
//!    new buffer seeded with the last `overlap_budget / 30` words of the
//!    old one, then the segment and `". "`.
//! 4. Flush whatever remains.
//!
//! Chunk boundaries are a compatibility contract: snapshots and fixtures
//! depend on them, including the `/ 30` overlap sizing.
//!
//! # Example
//!
//! ```rust
//! use aula_core::chunk::{chunk_text, ChunkingParams};
//!
//! let fragments = chunk_text("Hello world. Second sentence", "intro.pdf", &ChunkingParams::default());
//! assert_eq!(fragments.len(), 1);
//! assert_eq!(fragments[0].id, "intro.pdf_0");
//! assert_eq!(fragments[0].content, "Hello world. Second sentence.");
//! ```

use crate::models::Fragment;

/// Separator used to split text into sentence-like segments.
const SEGMENT_SEPARATOR: &str = ". ";

/// Characters of overlap budget per carried-over word.
const CHARS_PER_OVERLAP_WORD: usize = 30;

/// Punctuation that survives [`clean_text`].
const KEPT_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '-', '(', ')', '[', ']', '"', '\'',
];

/// Chunk sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    /// Fragment size target in characters.
    pub target_size: usize,
    /// Overlap budget in characters, converted to a word count.
    pub overlap_budget: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            target_size: 1000,
            overlap_budget: 200,
        }
    }
}

impl ChunkingParams {
    /// Number of trailing words carried into the next fragment.
    pub fn overlap_words(&self) -> usize {
        self.overlap_budget / CHARS_PER_OVERLAP_WORD
    }
}

/// Normalize raw extracted text before chunking.
///
/// Keeps word characters, whitespace, and common sentence punctuation;
/// everything else is dropped. Whitespace runs (newlines included) collapse
/// to a single space and the result is trimmed.
pub fn clean_text(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || *c == '_' || c.is_whitespace() || KEPT_PUNCTUATION.contains(c)
        })
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` into overlapping fragments owned by `document_name`.
///
/// Returns fragments with contiguous `chunk_index` values starting at 0.
/// Blank input yields no fragments.
pub fn chunk_text(text: &str, document_name: &str, params: &ChunkingParams) -> Vec<Fragment> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut fragments = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for segment in text.split(SEGMENT_SEPARATOR) {
        let segment_chars = segment.chars().count();

        if buffer_chars + segment_chars < params.target_size {
            buffer.push_str(segment);
            buffer.push_str(SEGMENT_SEPARATOR);
            buffer_chars += segment_chars + SEGMENT_SEPARATOR.len();
            continue;
        }

        let trimmed = buffer.trim();
        if !trimmed.is_empty() {
            fragments.push(Fragment::new(document_name, fragments.len(), trimmed));
        }

        let mut next = overlap_tail(&buffer, params.overlap_words());
        next.push(' ');
        next.push_str(segment);
        next.push_str(SEGMENT_SEPARATOR);
        buffer_chars = next.chars().count();
        buffer = next;
    }

    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        fragments.push(Fragment::new(document_name, fragments.len(), trimmed));
    }

    fragments
}

/// Last `count` whitespace-separated words of `buffer`, joined by spaces.
fn overlap_tail(buffer: &str, count: usize) -> String {
    let words: Vec<&str> = buffer.split_whitespace().collect();
    let start = words.len().saturating_sub(count);
    words[start..].join(" ")
}
