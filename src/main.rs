//! # Aula CLI (`aula`)
//!
//! Index course PDFs and ask questions about them.
//!
//! ## Usage
//!
//! ```bash
//! aula --config ./config/aula.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `aula add <PDF>...` | Extract, chunk and index one or more PDFs |
//! | `aula remove <NAME>` | Remove a document from the index |
//! | `aula clear` | Remove every document |
//! | `aula list` | List indexed documents |
//! | `aula stats` | Index statistics |
//! | `aula search "<query>"` | Ranked fragments for a query |
//! | `aula ask "<query>"` | Answer a question from the indexed material |
//! | `aula serve` | Start the HTTP API |
//!
//! Logs go to stderr and are controlled by `RUST_LOG` (default `aula=info`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

use aula::answer::Answer;
use aula::app::AppContext;
use aula::config;
use aula::{server, stats};
use aula_core::ScoredFragment;

/// Characters of fragment content shown under each source.
const SOURCE_PREVIEW_CHARS: usize = 200;

/// Aula — lexical retrieval-augmented answers over course material.
#[derive(Parser)]
#[command(
    name = "aula",
    about = "Aula — ask questions about your course PDFs",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/aula.toml`. Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/aula.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk and index PDFs.
    ///
    /// Each file is indexed under its file name; re-adding a name replaces
    /// its previous fragments. A failing file is reported and the rest
    /// are still processed.
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Remove a document and its stored copy.
    Remove { name: String },

    /// Remove every document and delete the snapshot.
    Clear,

    /// List indexed documents.
    List,

    /// Show index statistics.
    Stats,

    /// Search the index.
    Search {
        query: String,

        /// Maximum number of results (defaults to `retrieval.top_k`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the indexed material.
    Ask {
        query: String,

        /// Print the answer and its sources as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API on `server.bind`.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aula=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_or_minimal(&cli.config)
        .with_context(|| format!("invalid configuration: {}", cli.config.display()))?;
    let mut app = AppContext::open(cfg);

    match cli.command {
        Commands::Add { files } => run_add(&mut app, &files)?,
        Commands::Remove { name } => {
            let removed = app.remove_document(&name);
            if removed == 0 {
                anyhow::bail!("document not indexed: {}", name);
            }
            println!("Removed {} ({} fragments).", name, removed);
        }
        Commands::Clear => {
            app.clear_all();
            println!("Index cleared.");
        }
        Commands::List => stats::run_list(&app),
        Commands::Stats => stats::run_stats(&app),
        Commands::Search { query, limit, json } => {
            if limit == Some(0) {
                anyhow::bail!("--limit must be >= 1");
            }
            let results = app.search(&query, limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
        }
        Commands::Ask { query, json } => {
            let answer = app.ask(&query);
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print_answer(&answer);
            }
        }
        Commands::Serve => {
            let bind = app.config().server.bind.clone();
            let shared = Arc::new(Mutex::new(app));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::run_server(shared.clone(), &bind))?;
        }
    }

    Ok(())
}

fn run_add(app: &mut AppContext, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut failed = 0;
    for path in files {
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().to_string(),
            None => {
                eprintln!("✗ {}: not a file", path.display());
                failed += 1;
                continue;
            }
        };
        match app.process_and_index(path, &name) {
            Ok(count) => println!("✓ {}: {} fragments", name, count),
            Err(e) => {
                eprintln!("✗ {}: {}", name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, files.len());
    }
    Ok(())
}

fn print_results(results: &[ScoredFragment]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, r) in results.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} #{}",
            i + 1,
            r.score,
            r.fragment.document,
            r.fragment.chunk_index
        );
        println!("    excerpt: \"{}\"", preview(&r.fragment.content));
        println!("    id: {}", r.fragment.id);
        println!();
    }
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);
    if answer.sources.is_empty() {
        return;
    }
    println!();
    println!("Sources:");
    for s in &answer.sources {
        println!("📄 {} - relevance: {:.2}", s.fragment.document, s.score);
        println!("   {}", preview(&s.fragment.content));
    }
}

fn preview(content: &str) -> String {
    let mut out: String = content.chars().take(SOURCE_PREVIEW_CHARS).collect();
    if content.chars().count() > SOURCE_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
