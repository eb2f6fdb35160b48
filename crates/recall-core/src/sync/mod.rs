//! Source synchronization
//!
//! Reconciles what is on disk with what is stored: walk a source's `.md`
//! files, parse out cards, insert the ones the store has never seen, and
//! delete stored cards whose content no longer exists anywhere in the
//! source (orphans). Git sources are mirrored locally first.
//!
//! Per-file problems (unreadable file, insert conflict) are collected into
//! the report rather than aborting the walk; one broken document should
//! not stop a whole source from syncing.

mod git;

pub use git::{clone_or_pull, mirror_path, GitError};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::parser::parse_file;
use crate::storage::{SourceKind, SourceRecord, StorageError, Store};

/// Sync error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Git mirror failure
    #[error(transparent)]
    Git(#[from] GitError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of reconciling one source
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Source row id
    pub source_id: i64,
    /// Source path or URL
    pub path: String,
    /// Card occurrences seen in files (duplicates included)
    pub cards_found: usize,
    /// Cards newly inserted
    pub cards_added: usize,
    /// Orphaned cards deleted
    pub cards_removed: usize,
    /// Per-file problems that did not abort the sync
    pub errors: Vec<String>,
}

/// Reconcile every configured source.
///
/// A source that fails outright (missing directory, unreachable remote)
/// contributes a report carrying the error; the remaining sources still
/// sync.
pub fn sync_all(store: &Store, repos_dir: &Path) -> Result<Vec<SyncReport>, SyncError> {
    let sources = store.sources()?;
    if sources.is_empty() {
        tracing::info!("no sources configured, nothing to sync");
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(repos_dir)?;

    let mut reports = Vec::with_capacity(sources.len());
    for source in sources {
        match sync_source(store, &source, repos_dir) {
            Ok(report) => {
                tracing::info!(
                    source = %source.path,
                    found = report.cards_found,
                    added = report.cards_added,
                    removed = report.cards_removed,
                    "source reconciled"
                );
                reports.push(report);
            }
            Err(e) => {
                tracing::warn!(source = %source.path, error = %e, "source sync failed");
                reports.push(SyncReport {
                    source_id: source.id,
                    path: source.path.clone(),
                    errors: vec![e.to_string()],
                    ..Default::default()
                });
            }
        }
    }
    Ok(reports)
}

/// Reconcile a single source.
///
/// For git sources the remote is cloned or fast-forwarded into its mirror
/// under `repos_dir` before the scan.
pub fn sync_source(
    store: &Store,
    source: &SourceRecord,
    repos_dir: &Path,
) -> Result<SyncReport, SyncError> {
    let scan_root = match source.kind {
        SourceKind::Local => PathBuf::from(&source.path),
        SourceKind::Git => {
            let mirror = git::mirror_path(repos_dir, &source.path)?;
            git::clone_or_pull(&source.path, &mirror)?;
            mirror
        }
    };

    reconcile(store, source, &scan_root)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Walk `root`, diff found card identities against the store, and converge.
fn reconcile(store: &Store, source: &SourceRecord, root: &Path) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport {
        source_id: source.id,
        path: source.path.clone(),
        ..Default::default()
    };
    let mut found: HashSet<String> = HashSet::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.errors.push(format!("walking {}: {}", root.display(), e));
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let cards = match parse_file(entry.path()) {
            Ok(cards) => cards,
            Err(e) => {
                report
                    .errors
                    .push(format!("parsing {}: {}", entry.path().display(), e));
                continue;
            }
        };

        for card in cards {
            let hash = card.hash();
            report.cards_found += 1;
            let first_sighting = found.insert(hash.clone());
            if !first_sighting {
                continue;
            }

            match store.get_card(&hash) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::debug!(card = %hash, file = %entry.path().display(), "new card");
                    match store.insert_card(&card, Some(source.id)) {
                        Ok(_) => report.cards_added += 1,
                        Err(e) => report.errors.push(format!("inserting {}: {}", hash, e)),
                    }
                }
                Err(e) => report.errors.push(format!("looking up {}: {}", hash, e)),
            }
        }
    }

    for stored in store.cards_for_source(source.id)? {
        if found.contains(&stored.hash) {
            continue;
        }
        tracing::debug!(card = %stored.hash, "deleting orphaned card");
        match store.delete_card(&stored.hash) {
            Ok(_) => report.cards_removed += 1,
            Err(e) => report.errors.push(format!("deleting {}: {}", stored.hash, e)),
        }
    }

    store.touch_scanned(source.id)?;
    Ok(report)
}
