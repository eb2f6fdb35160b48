//! Recall - personal knowledge review
//!
//! Extracts question/answer cards from plain-text notes, tracks each card
//! by a content-derived identity, and schedules reviews with a simplified
//! FSRS memory model. One binary covers the CLI workflows and the JSON API
//! server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recall_core::{sync_all, Scheduler, SourceKind, Store};
use recall_server::api;

/// Recall - spaced-repetition review of your own notes
#[derive(Parser)]
#[command(name = "recall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract cards from markdown notes and review them on an FSRS-style schedule")]
struct Cli {
    /// Path to the SQLite database (defaults to the platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory for git source mirrors (defaults to <data dir>/repos)
    #[arg(long, global = true)]
    repos_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen_addr: SocketAddr,
    },

    /// Reconcile all configured sources
    Sync,

    /// Show cards due for review
    Due {
        /// Maximum number of cards to list
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// List configured sources
    Sources,

    /// Register a card source (local directory or git URL)
    AddSource {
        /// Directory path or git URL
        path: String,
    },

    /// Remove a source and every card that came from it
    RemoveSource {
        /// Source id as shown by `recall sources`
        id: i64,
    },
}

fn main() -> anyhow::Result<()> {
    // Logging to stderr; stdout belongs to command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let store = Arc::new(Store::open(cli.db.clone())?);
    let repos_dir = match cli.repos_dir.clone() {
        Some(dir) => dir,
        None => Store::default_data_dir()?.join("repos"),
    };

    match cli.command {
        Commands::Serve { listen_addr } => run_serve(store, repos_dir, listen_addr),
        Commands::Sync => run_sync(&store, &repos_dir),
        Commands::Due { limit } => run_due(&store, limit),
        Commands::Sources => run_sources(&store),
        Commands::AddSource { path } => run_add_source(&store, &path),
        Commands::RemoveSource { id } => run_remove_source(&store, id),
    }
}

/// Run the API server on a multi-threaded runtime
fn run_serve(store: Arc<Store>, repos_dir: PathBuf, addr: SocketAddr) -> anyhow::Result<()> {
    let scheduler = Arc::new(Scheduler::default());
    info!("starting recall v{}", recall_core::VERSION);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(api::serve(store, scheduler, repos_dir, addr))
        .map_err(|e| anyhow::anyhow!("server error: {}", e))
}

/// Reconcile every source and print the per-source reports
fn run_sync(store: &Store, repos_dir: &PathBuf) -> anyhow::Result<()> {
    let reports = sync_all(store, repos_dir)?;
    if reports.is_empty() {
        println!("{}", "No sources configured. Add one with: recall add-source <path>".dimmed());
        return Ok(());
    }

    for report in &reports {
        println!(
            "{} {}: {} found, {} added, {} removed",
            "synced".green().bold(),
            report.path,
            report.cards_found,
            report.cards_added,
            report.cards_removed,
        );
        for error in &report.errors {
            println!("  {} {}", "error:".red(), error);
        }
    }
    Ok(())
}

/// List due cards
fn run_due(store: &Store, limit: usize) -> anyhow::Result<()> {
    let due = store.due_cards(Utc::now(), Some(limit))?;

    println!(
        "{}",
        format!("=== {} card(s) due for review ===", due.len()).cyan().bold()
    );
    for card in &due {
        let marker = if card.is_new() { "new".yellow() } else { "due".green() };
        println!(
            "{} {} {}",
            marker,
            card.hash[..12].dimmed(),
            card.question
        );
        println!("    due {}", card.due_at.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

/// List sources
fn run_sources(store: &Store) -> anyhow::Result<()> {
    let sources = store.sources()?;
    if sources.is_empty() {
        println!("{}", "No sources configured.".dimmed());
        return Ok(());
    }

    for source in sources {
        let scanned = source
            .last_scanned
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:>4}  {}  {}  last scanned {}",
            source.id,
            source.kind.to_string().yellow(),
            source.path.white().bold(),
            scanned.dimmed(),
        );
    }
    Ok(())
}

/// Register a source
fn run_add_source(store: &Store, path: &str) -> anyhow::Result<()> {
    let path = path.trim();
    anyhow::ensure!(!path.is_empty(), "source path cannot be empty");

    if store.find_source(path)?.is_some() {
        anyhow::bail!("source already registered: {}", path);
    }

    let kind = SourceKind::infer(path);
    let source = store.add_source(path, kind)?;
    println!(
        "{} {} source {} (id {})",
        "added".green().bold(),
        source.kind,
        source.path,
        source.id
    );
    println!("Run {} to pull in its cards.", "recall sync".bold());
    Ok(())
}

/// Remove a source
fn run_remove_source(store: &Store, id: i64) -> anyhow::Result<()> {
    if store.remove_source(id)? {
        println!("{} source {}", "removed".green().bold(), id);
        Ok(())
    } else {
        anyhow::bail!("no source with id {}", id)
    }
}
