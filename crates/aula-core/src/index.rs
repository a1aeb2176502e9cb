//! The in-memory document index.
//!
//! [`DocumentIndex`] owns every [`Fragment`] across all documents, in
//! insertion order, and a [`SnapshotStore`] it rewrites after each
//! mutation. Mutations are applied in memory first; the returned `Result`
//! only reports whether the snapshot write succeeded, so a failed write
//! leaves a working index and the next successful write catches up.
//!
//! # Search
//!
//! 1. Tokenize the query; an empty token list yields no results.
//! 2. Score every fragment with [`score`], tokenizing (and caching) any
//!    fragment whose tokens are missing.
//! 3. Drop zero scores, stable-sort by score descending, keep the first `k`.

use std::cmp::Ordering;

use anyhow::Result;

use crate::models::{DocumentSummary, Fragment, ScoredFragment};
use crate::score::score;
use crate::store::SnapshotStore;
use crate::tokenize::tokenize;

/// Ordered fragment collection backed by a snapshot.
pub struct DocumentIndex<S: SnapshotStore> {
    fragments: Vec<Fragment>,
    store: S,
}

impl<S: SnapshotStore> DocumentIndex<S> {
    /// Restore the index from `store`.
    ///
    /// A missing or unreadable snapshot yields an empty index; the failure
    /// is logged, never returned.
    pub fn open(store: S) -> Self {
        let fragments = match store.load() {
            Ok(Some(fragments)) => {
                tracing::info!(fragments = fragments.len(), "restored index snapshot");
                fragments
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "index snapshot unreadable, starting empty");
                Vec::new()
            }
        };
        Self { fragments, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of fragments stored for `document_name`.
    pub fn fragment_count(&self, document_name: &str) -> usize {
        self.fragments
            .iter()
            .filter(|f| f.document == document_name)
            .count()
    }

    /// Indexed documents with their fragment counts, in first-seen order.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        let mut out: Vec<DocumentSummary> = Vec::new();
        for f in &self.fragments {
            match out.iter_mut().find(|d| d.name == f.document) {
                Some(entry) => entry.fragments += 1,
                None => out.push(DocumentSummary {
                    name: f.document.clone(),
                    fragments: 1,
                    processed_at: None,
                }),
            }
        }
        out
    }

    /// Replace every fragment of `document_name` with `fragments`.
    ///
    /// Each new fragment gets its token cache filled before insertion.
    /// Re-adding a document never leaves stale fragments behind.
    pub fn add_document(&mut self, fragments: Vec<Fragment>, document_name: &str) -> Result<()> {
        self.fragments.retain(|f| f.document != document_name);
        self.fragments.extend(fragments.into_iter().map(|mut f| {
            f.processed_tokens = Some(tokenize(&f.content));
            f
        }));
        self.persist()
    }

    /// Remove every fragment of `document_name`. Returns how many were removed.
    pub fn remove_document(&mut self, document_name: &str) -> Result<usize> {
        let before = self.fragments.len();
        self.fragments.retain(|f| f.document != document_name);
        let removed = before - self.fragments.len();
        self.persist()?;
        Ok(removed)
    }

    /// Drop everything and delete the snapshot.
    pub fn clear(&mut self) -> Result<()> {
        self.fragments.clear();
        self.store.remove()
    }

    /// Top-`k` fragments for `query`, best first.
    pub fn search(&mut self, query: &str, k: usize) -> Vec<ScoredFragment> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.fragments.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for fragment in &mut self.fragments {
            if fragment.processed_tokens.is_none() {
                fragment.processed_tokens = Some(tokenize(&fragment.content));
            }
            let tokens = fragment.processed_tokens.as_deref().unwrap_or_default();

            let s = score(&query_tokens, tokens);
            if s > 0.0 {
                results.push(ScoredFragment {
                    fragment: fragment.clone(),
                    score: s,
                });
            }
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(k);
        results
    }

    fn persist(&self) -> Result<()> {
        let result = self.store.save(&self.fragments);
        if result.is_ok() {
            tracing::debug!(fragments = self.fragments.len(), "index snapshot written");
        }
        result
    }
}
