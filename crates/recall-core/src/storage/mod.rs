//! Storage Module
//!
//! SQLite-based persistence for cards, sources, and the review log:
//! - cards keyed by content hash, carrying their scheduling state
//! - versioned schema migrations
//! - the serialized read-modify-write review cycle

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{
    CardRecord, Result, ReviewLogRecord, SourceKind, SourceRecord, StorageError, Store, StoreStats,
};
