//! # Recall Core
//!
//! Engine for a personal knowledge-review tool. Plain-text documents are
//! scanned for atomic question/answer/context units ("cards"), each card
//! gets a content-derived identity, and a simplified FSRS memory model
//! decides when it should next be shown to the learner.
//!
//! - **Scheduler**: stability/difficulty memory state, rating-driven
//!   transitions, due-date computation (the algorithmic core)
//! - **Parser**: line-oriented `Q:` / `A:` / `C:` scanner
//! - **Identity**: normalize-then-digest SHA-256 card hashes
//! - **Storage**: SQLite store for cards, sources, and the review log
//! - **Sync**: local-directory and git-source reconciliation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recall_core::{parse_str, Rating, Scheduler, Store};
//!
//! let store = Store::open(None)?;
//! let scheduler = Scheduler::default();
//!
//! // Ingest cards from a document
//! for card in parse_str("Q: What is a lifetime?\nA: A scope of validity.") {
//!     store.insert_card(&card, None)?;
//! }
//!
//! // Review the earliest due card
//! if let Some(record) = store.due_cards(chrono::Utc::now(), Some(1))?.pop() {
//!     store.apply_review(&record.hash, Rating::Good, &scheduler, chrono::Utc::now())?;
//! }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod card;
pub mod parser;
pub mod scheduler;
pub mod storage;
pub mod sync;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Card model and content identity
pub use card::{content_hash, normalize, Card};

// Document parser
pub use parser::{parse_file, parse_str};

// Scheduler
pub use scheduler::{
    MemoryState, ParamsError, Rating, Scheduler, SchedulerParams, DEFAULT_DESIRED_RETENTION,
    STABILITY_FLOOR,
};

// Storage layer
pub use storage::{
    CardRecord, ReviewLogRecord, Result, SourceKind, SourceRecord, StorageError, Store, StoreStats,
};

// Source synchronization
pub use sync::{clone_or_pull, mirror_path, sync_all, sync_source, GitError, SyncError, SyncReport};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        content_hash, parse_str, Card, CardRecord, MemoryState, Rating, Result, Scheduler,
        SchedulerParams, SourceKind, StorageError, Store, SyncReport,
    };
}
