//! API shared state

use std::path::PathBuf;
use std::sync::Arc;

use recall_core::{Scheduler, Store};

/// Shared application state for the API
#[derive(Clone)]
pub struct AppState {
    /// Card and source store (interior locking, shared freely)
    pub store: Arc<Store>,
    /// Validated scheduler, shared read-only
    pub scheduler: Arc<Scheduler>,
    /// Base directory for git source mirrors
    pub repos_dir: PathBuf,
}

impl AppState {
    /// Bundle the collaborators the handlers need.
    pub fn new(store: Arc<Store>, scheduler: Arc<Scheduler>, repos_dir: PathBuf) -> Self {
        Self {
            store,
            scheduler,
            repos_dir,
        }
    }
}
