//! Test Deck Harness
//!
//! Provides an isolated store plus a scratch notes directory per test:
//! - temporary database, deleted when the harness is dropped
//! - helpers for writing note files and registering them as a source
//! - everything on real disk so the journeys exercise the actual storage
//!   and reconciliation paths

use std::fs;
use std::path::{Path, PathBuf};

use recall_core::{SourceKind, SourceRecord, Store, SyncReport};
use tempfile::TempDir;

/// An isolated deck: a store, a notes directory, and a mirror directory.
pub struct TestDeck {
    /// The store under test
    pub store: Store,
    /// Directory the note files live in
    pub notes_dir: PathBuf,
    /// Base directory for git mirrors
    pub repos_dir: PathBuf,
    _temp: TempDir,
}

impl TestDeck {
    /// Create a fresh deck in a temporary directory.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp directory");
        let notes_dir = temp.path().join("notes");
        let repos_dir = temp.path().join("repos");
        fs::create_dir_all(&notes_dir).expect("failed to create notes dir");

        let store =
            Store::open(Some(temp.path().join("recall.db"))).expect("failed to open test store");

        Self {
            store,
            notes_dir,
            repos_dir,
            _temp: temp,
        }
    }

    /// Write (or overwrite) a note file inside the notes directory.
    pub fn write_note(&self, name: &str, content: &str) -> PathBuf {
        let path = self.notes_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create note parent dir");
        }
        fs::write(&path, content).expect("failed to write note");
        path
    }

    /// Register the notes directory as a local source.
    pub fn register_notes_source(&self) -> SourceRecord {
        self.store
            .add_source(
                self.notes_dir.to_str().expect("notes path is valid utf-8"),
                SourceKind::Local,
            )
            .expect("failed to add source")
    }

    /// Register an arbitrary directory as a local source.
    pub fn register_dir_source(&self, dir: &Path) -> SourceRecord {
        self.store
            .add_source(
                dir.to_str().expect("dir path is valid utf-8"),
                SourceKind::Local,
            )
            .expect("failed to add source")
    }

    /// Reconcile every configured source.
    pub fn sync(&self) -> Vec<SyncReport> {
        recall_core::sync_all(&self.store, &self.repos_dir).expect("sync failed")
    }
}

impl Default for TestDeck {
    fn default() -> Self {
        Self::new()
    }
}
