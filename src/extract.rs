//! PDF text extraction.
//!
//! Turns a PDF on disk into a single string, one `--- Página N ---` marker
//! per page that produced text, then normalizes it with
//! [`clean_text`](aula_core::chunk::clean_text). Unreadable or corrupt files
//! yield [`Error::Extraction`]; the caller decides whether to continue with
//! other files.

use std::path::Path;

use aula_core::chunk::clean_text;

use crate::error::{Error, Result};

/// Read `path` and return its cleaned text.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::Extraction {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let raw = extract_pdf_pages(&bytes).map_err(|message| Error::Extraction {
        path: path.to_path_buf(),
        message,
    })?;

    let text = clean_text(&raw);
    tracing::debug!(path = %path.display(), chars = text.chars().count(), "extracted pdf text");
    Ok(text)
}

/// Extract raw page text from in-memory PDF bytes, with page markers.
pub fn extract_pdf_pages(bytes: &[u8]) -> std::result::Result<String, String> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| e.to_string())?;
    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("\n--- Página {} ---\n{}", i + 1, page));
    }
    out
}
