//! # Aula Core
//!
//! The in-process retrieval engine behind Aula: fragment models, text
//! cleaning and chunking, the lexical preprocessor, the similarity scorer,
//! and the document index.
//!
//! This crate does no filesystem, network, or async work of its own.
//! Persistence goes through the [`store::SnapshotStore`] trait, which the
//! application implements against disk.
//!
//! ```rust
//! use aula_core::chunk::{chunk_text, ChunkingParams};
//! use aula_core::index::DocumentIndex;
//! use aula_core::store::memory::MemorySnapshot;
//!
//! let mut index = DocumentIndex::open(MemorySnapshot::new());
//! let fragments = chunk_text(
//!     "Rust ownership rules prevent data races. Borrowing is checked at compile time.",
//!     "rust.pdf",
//!     &ChunkingParams::default(),
//! );
//! index.add_document(fragments, "rust.pdf").unwrap();
//!
//! let hits = index.search("ownership rules", 5);
//! assert_eq!(hits[0].fragment.document, "rust.pdf");
//! ```

pub mod chunk;
pub mod index;
pub mod models;
pub mod score;
pub mod store;
pub mod tokenize;

pub use index::DocumentIndex;
pub use models::{DocumentSummary, Fragment, ScoredFragment};
