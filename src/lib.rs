//! # Aula
//!
//! Lexical retrieval-augmented answers over course PDFs.
//!
//! PDFs are extracted, cleaned and split into overlapping fragments, which
//! the [`aula_core`] index ranks against a query with term-frequency cosine
//! similarity plus phrase and shared-term boosts. The best fragments become
//! the context of a single chat-completion call.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────────┐
//! │   PDF    │──▶│ Clean+Chunk  │──▶│  DocumentIndex   │
//! │ extract  │   │ (aula-core)  │   │ + JSON snapshot  │
//! └──────────┘   └──────────────┘   └────────┬─────────┘
//!                                            │
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌──────────┐
//!                 │   CLI    │         │   HTTP   │
//!                 │  (aula)  │         │  (axum)  │
//!                 └──────────┘         └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`extract`] | PDF text extraction |
//! | [`snapshot`] | On-disk index snapshot |
//! | [`llm`] | Chat-completions client |
//! | [`answer`] | Answer composition |
//! | [`app`] | Application context |
//! | [`stats`] | Listing and statistics output |
//! | [`server`] | HTTP JSON API |

pub mod answer;
pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod server;
pub mod snapshot;
pub mod stats;

pub use error::{Error, Result};
