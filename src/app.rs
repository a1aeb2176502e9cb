//! Application context.
//!
//! [`AppContext`] bundles the configuration, the on-disk [`DocumentIndex`]
//! and the answer [`Generator`]. The CLI builds one per invocation; the
//! HTTP server shares one behind a single mutex so that every mutation and
//! query is serialized.
//!
//! Persistence failures are logged and swallowed here: the in-memory index
//! stays authoritative for the rest of the process.

use std::path::{Path, PathBuf};

use aula_core::chunk::chunk_text;
use aula_core::{DocumentIndex, DocumentSummary, ScoredFragment};

use crate::answer::{compose_answer, Answer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::extract_pdf_text;
use crate::llm::{ChatClient, Generator};
use crate::snapshot::FileSnapshot;

pub struct AppContext {
    config: Config,
    index: DocumentIndex<FileSnapshot>,
    generator: Box<dyn Generator>,
}

impl AppContext {
    /// Open the index under `config.data.dir` with the configured chat client.
    pub fn open(config: Config) -> Self {
        let client = ChatClient::from_config(&config.llm);
        if !client.has_credential() {
            tracing::warn!(
                env = %config.llm.api_key_env,
                "no LLM API key configured; answers will report a configuration error"
            );
        }
        Self::with_generator(config, Box::new(client))
    }

    pub fn with_generator(config: Config, generator: Box<dyn Generator>) -> Self {
        let index = DocumentIndex::open(FileSnapshot::new(config.data.snapshot_path()));
        Self {
            config,
            index,
            generator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &DocumentIndex<FileSnapshot> {
        &self.index
    }

    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    /// Extract, chunk and index the PDF at `path` as `document_name`.
    ///
    /// Replaces any fragments previously stored under that name and returns
    /// the new fragment count. Only extraction failures are errors; a file
    /// that fails extraction leaves both the index and the stored copy as
    /// they were.
    pub fn process_and_index(&mut self, path: &Path, document_name: &str) -> Result<usize> {
        let text = extract_pdf_text(path)?;
        if let Err(e) = self.keep_upload_copy(path, document_name) {
            tracing::warn!(src = %path.display(), error = %e, "failed to keep upload copy");
        }

        let fragments = chunk_text(&text, document_name, &self.config.chunking.params());
        let count = fragments.len();
        if count == 0 {
            tracing::warn!(document = document_name, "no text extracted");
        }

        if let Err(e) = self.index.add_document(fragments, document_name) {
            warn_persistence(e);
        }
        tracing::info!(document = document_name, fragments = count, "indexed document");
        Ok(count)
    }

    /// Drop `document_name` from the index and delete its upload copy.
    /// Returns the number of fragments removed; an unknown name touches
    /// nothing.
    pub fn remove_document(&mut self, document_name: &str) -> usize {
        let removed = self.index.fragment_count(document_name);
        if removed == 0 {
            return 0;
        }
        if let Err(e) = self.index.remove_document(document_name) {
            warn_persistence(e);
        }

        if let Some(copy) = self.upload_path(document_name) {
            match std::fs::remove_file(&copy) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %copy.display(), error = %e, "failed to delete upload copy")
                }
            }
        }
        removed
    }

    /// Empty the index, delete the snapshot and wipe the uploads directory.
    pub fn clear_all(&mut self) {
        if let Err(e) = self.index.clear() {
            warn_persistence(e);
        }

        let uploads = self.config.data.uploads_dir();
        match std::fs::remove_dir_all(&uploads) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %uploads.display(), error = %e, "failed to wipe uploads")
            }
        }
    }

    /// Top fragments for `query`; `limit` defaults to `retrieval.top_k`.
    pub fn search(&mut self, query: &str, limit: Option<usize>) -> Vec<ScoredFragment> {
        let k = limit.unwrap_or(self.config.retrieval.top_k);
        self.index.search(query, k)
    }

    pub fn ask(&mut self, query: &str) -> Answer {
        compose_answer(
            query,
            &mut self.index,
            self.generator.as_ref(),
            self.config.retrieval.top_k,
        )
    }

    /// Indexed documents, with processing time taken from the upload copy.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.index
            .documents()
            .into_iter()
            .map(|mut doc| {
                doc.processed_at = self
                    .upload_path(&doc.name)
                    .and_then(|p| std::fs::metadata(p).ok())
                    .and_then(|m| m.modified().ok())
                    .map(|t| {
                        chrono::DateTime::<chrono::Local>::from(t)
                            .format("%Y-%m-%d %H:%M")
                            .to_string()
                    });
                doc
            })
            .collect()
    }

    /// Where the upload copy of `document_name` lives. `None` when the name
    /// has no usable file-name component.
    fn upload_path(&self, document_name: &str) -> Option<PathBuf> {
        let file_name = Path::new(document_name).file_name()?;
        Some(self.config.data.uploads_dir().join(file_name))
    }

    fn keep_upload_copy(&self, path: &Path, document_name: &str) -> Result<()> {
        let Some(dest) = self.upload_path(document_name) else {
            tracing::warn!(document = document_name, "document name unusable as file name; not keeping a copy");
            return Ok(());
        };
        if same_file(path, &dest) {
            return Ok(());
        }

        std::fs::create_dir_all(self.config.data.uploads_dir())?;
        std::fs::copy(path, &dest)?;
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn warn_persistence(err: anyhow::Error) {
    let err = Error::persistence(err);
    tracing::warn!(error = %err, "index changes kept in memory only");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::minimal_pdf;
    use tempfile::TempDir;

    struct EchoGenerator;

    impl Generator for EchoGenerator {
        fn model_name(&self) -> &str {
            "echo"
        }

        fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", user_prompt.len()))
        }
    }

    fn context(tmp: &TempDir) -> AppContext {
        let mut config = Config::minimal();
        config.data.dir = tmp.path().join("data");
        AppContext::with_generator(config, Box::new(EchoGenerator))
    }

    fn write_pdf(tmp: &TempDir, file: &str, phrase: &str) -> PathBuf {
        let path = tmp.path().join(file);
        std::fs::write(&path, minimal_pdf(phrase)).unwrap();
        path
    }

    #[test]
    fn test_process_and_index_keeps_copy_and_persists() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let pdf = write_pdf(&tmp, "redes.pdf", "protocolo TCP garantiza entrega ordenada");

        let count = app.process_and_index(&pdf, "redes.pdf").unwrap();
        assert_eq!(count, 1);
        assert!(app.config().data.uploads_dir().join("redes.pdf").exists());
        assert!(app.config().data.snapshot_path().exists());

        let docs = app.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "redes.pdf");
        assert_eq!(docs[0].fragments, 1);
        let processed_at = docs[0].processed_at.as_deref().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(processed_at, "%Y-%m-%d %H:%M").is_ok());

        let reopened = context(&tmp);
        assert_eq!(reopened.index().len(), 1);
    }

    #[test]
    fn test_reprocessing_replaces_fragments() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let first = write_pdf(&tmp, "a.pdf", "primera version del documento");
        let second = write_pdf(&tmp, "b.pdf", "segunda version completamente distinta");

        app.process_and_index(&first, "apuntes.pdf").unwrap();
        app.process_and_index(&second, "apuntes.pdf").unwrap();

        assert_eq!(app.index().fragment_count("apuntes.pdf"), 1);
        assert!(app.search("primera", None).is_empty());
        assert_eq!(app.search("segunda", None).len(), 1);
    }

    #[test]
    fn test_extraction_failure_leaves_index_untouched() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let bad = tmp.path().join("roto.pdf");
        std::fs::write(&bad, b"not a pdf").unwrap();

        let err = app.process_and_index(&bad, "roto.pdf").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(app.index().is_empty());
    }

    #[test]
    fn test_failed_reprocess_keeps_previous_copy() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let good = write_pdf(&tmp, "good.pdf", "arboles binarios de busqueda");
        app.process_and_index(&good, "x.pdf").unwrap();
        let stored = app.config().data.uploads_dir().join("x.pdf");
        let before = std::fs::read(&stored).unwrap();
        let processed_at = app.documents()[0].processed_at.clone();

        let bad = tmp.path().join("bad.pdf");
        std::fs::write(&bad, b"garbage").unwrap();
        let err = app.process_and_index(&bad, "x.pdf").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));

        assert_eq!(app.index().fragment_count("x.pdf"), 1);
        assert_eq!(std::fs::read(&stored).unwrap(), before);
        assert_eq!(app.documents()[0].processed_at, processed_at);
    }

    #[test]
    fn test_failed_first_add_keeps_no_copy() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let bad = tmp.path().join("roto.pdf");
        std::fs::write(&bad, b"not a pdf").unwrap();

        assert!(app.process_and_index(&bad, "roto.pdf").is_err());
        assert!(!app.config().data.uploads_dir().join("roto.pdf").exists());
    }

    #[test]
    fn test_copy_failure_is_io_error_and_indexing_continues() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let uploads = app.config().data.uploads_dir();
        std::fs::create_dir_all(uploads.parent().unwrap()).unwrap();
        std::fs::write(&uploads, b"a file where the directory should be").unwrap();
        let pdf = write_pdf(&tmp, "grafos.pdf", "recorrido en profundidad");

        let err = app.keep_upload_copy(&pdf, "grafos.pdf").unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        assert_eq!(app.process_and_index(&pdf, "grafos.pdf").unwrap(), 1);
        assert_eq!(app.index().fragment_count("grafos.pdf"), 1);
    }

    #[test]
    fn test_remove_unknown_document_leaves_files_alone() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let uploads = app.config().data.uploads_dir();
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::write(uploads.join("ghost.pdf"), b"stray").unwrap();

        assert_eq!(app.remove_document("ghost.pdf"), 0);
        assert!(uploads.join("ghost.pdf").exists());
    }

    #[test]
    fn test_remove_document_deletes_copy() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let pdf = write_pdf(&tmp, "so.pdf", "planificador de procesos");
        app.process_and_index(&pdf, "so.pdf").unwrap();

        assert_eq!(app.remove_document("so.pdf"), 1);
        assert!(!app.config().data.uploads_dir().join("so.pdf").exists());
        assert_eq!(app.remove_document("so.pdf"), 0);
        assert!(app.documents().is_empty());
    }

    #[test]
    fn test_clear_all_wipes_everything() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let pdf = write_pdf(&tmp, "bd.pdf", "normalizacion de tablas relacionales");
        app.process_and_index(&pdf, "bd.pdf").unwrap();

        app.clear_all();
        assert!(app.index().is_empty());
        assert!(!app.config().data.snapshot_path().exists());
        assert!(!app.config().data.uploads_dir().exists());
    }

    #[test]
    fn test_ask_uses_generator_with_sources() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        let pdf = write_pdf(&tmp, "bd.pdf", "normalizacion de tablas relacionales");
        app.process_and_index(&pdf, "bd.pdf").unwrap();

        let answer = app.ask("tablas relacionales");
        assert!(answer.answer.starts_with("echo: "));
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].fragment.document, "bd.pdf");
    }

    #[test]
    fn test_search_limit_overrides_top_k() {
        let tmp = TempDir::new().unwrap();
        let mut app = context(&tmp);
        for (file, phrase) in [
            ("uno.pdf", "algoritmo de ordenamiento rapido"),
            ("dos.pdf", "algoritmo de busqueda binaria"),
        ] {
            let pdf = write_pdf(&tmp, file, phrase);
            app.process_and_index(&pdf, file).unwrap();
        }

        assert_eq!(app.search("algoritmo", None).len(), 2);
        assert_eq!(app.search("algoritmo", Some(1)).len(), 1);
    }
}
