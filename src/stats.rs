//! Document listing and index statistics.
//!
//! Backs `aula list` and `aula stats`: what is indexed, how many fragments
//! each document contributed, and where the snapshot lives on disk.

use aula_core::DocumentSummary;

use crate::app::AppContext;

/// Print one line per indexed document.
pub fn run_list(app: &AppContext) {
    let docs = app.documents();
    if docs.is_empty() {
        println!("No documents indexed.");
        return;
    }
    print_documents(&docs);
}

/// Print totals, snapshot location and a per-document breakdown.
pub fn run_stats(app: &AppContext) {
    let docs = app.documents();
    let snapshot = app.config().data.snapshot_path();
    let snapshot_size = std::fs::metadata(&snapshot).map(|m| m.len()).unwrap_or(0);

    println!("Aula — Index Stats");
    println!("==================");
    println!();
    println!("  Snapshot:    {}", snapshot.display());
    println!("  Size:        {}", format_bytes(snapshot_size));
    println!();
    println!("  Documents:   {}", docs.len());
    println!("  Fragments:   {}", app.index().len());
    println!("  Model:       {}", app.generator().model_name());

    if !docs.is_empty() {
        println!();
        println!("  By document:");
        print_documents(&docs);
    }

    println!();
}

fn print_documents(docs: &[DocumentSummary]) {
    println!("  {:<40} {:>9}   {}", "DOCUMENT", "FRAGMENTS", "PROCESSED");
    println!("  {}", "-".repeat(70));
    for d in docs {
        println!(
            "  {:<40} {:>9}   {}",
            d.name,
            d.fragments,
            d.processed_at.as_deref().unwrap_or("-")
        );
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
