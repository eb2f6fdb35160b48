//! SQLite Store Implementation
//!
//! Persistence for cards, sources, and the review log. Timestamps are
//! RFC 3339 text; card primary keys are content hashes. The store owns a
//! writer and a reader connection behind mutexes so all methods take
//! `&self` and the value is `Send + Sync`; callers share an `Arc<Store>`.
//!
//! Every review runs as one transaction on the single writer connection,
//! which is what serializes concurrent reviews of the same card (the
//! at-most-one-concurrent-writer-per-card contract the scheduler relies
//! on).

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::card::Card;
use crate::scheduler::{MemoryState, Rating, Scheduler};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Card not found
    #[error("Card not found: {0}")]
    CardNotFound(String),
    /// Source not found
    #[error("Source not found: {0}")]
    SourceNotFound(i64),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// RECORD TYPES
// ============================================================================

/// Kind of card source
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A directory on the local filesystem
    Local,
    /// A remote git repository, mirrored locally before scanning
    Git,
}

impl SourceKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Git => "git",
        }
    }

    /// Parse from string name; unknown names fall back to `Local`.
    pub fn parse_name(s: &str) -> Self {
        match s {
            "git" => SourceKind::Git,
            _ => SourceKind::Local,
        }
    }

    /// Guess the kind from the shape of a path or URL.
    pub fn infer(path: &str) -> Self {
        if path.ends_with(".git")
            || path.starts_with("git@")
            || path.starts_with("https://")
            || path.starts_with("http://")
        {
            SourceKind::Git
        } else {
            SourceKind::Local
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A card source row
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    /// Row id
    pub id: i64,
    /// Local directory path or git URL
    pub path: String,
    /// Local or git
    pub kind: SourceKind,
    /// When the source was last reconciled
    pub last_scanned: Option<DateTime<Utc>>,
}

/// A stored card with its scheduling state
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    /// Content-derived identity (64 hex chars)
    pub hash: String,
    /// The prompt
    pub question: String,
    /// The expected recall
    pub answer: String,
    /// Optional framing
    pub context: String,
    /// Memory stability in days (0 = never reviewed)
    pub stability: f64,
    /// Intrinsic hardness (0 until first review, then [1, 10])
    pub difficulty: f64,
    /// When the card should next be surfaced
    pub due_at: DateTime<Utc>,
    /// When the card was last reviewed
    pub last_reviewed: Option<DateTime<Utc>>,
    /// When the card was first stored
    pub created_at: DateTime<Utc>,
    /// Owning source, if any
    pub source_id: Option<i64>,
    /// Path of the owning source (joined in by every card query)
    pub source_path: Option<String>,
}

impl CardRecord {
    /// The scheduling view of this card.
    pub fn memory_state(&self) -> MemoryState {
        MemoryState {
            stability: self.stability,
            difficulty: self.difficulty,
            last_reviewed: self.last_reviewed,
        }
    }

    /// Whether the card has never been reviewed.
    pub fn is_new(&self) -> bool {
        self.stability == 0.0
    }
}

/// One review event from the audit log
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogRecord {
    /// Row id
    pub id: i64,
    /// Reviewed card
    pub card_hash: String,
    /// The learner's rating
    pub rating: Rating,
    /// Stability after the review
    pub stability: f64,
    /// Difficulty after the review
    pub difficulty: f64,
    /// When the review happened
    pub reviewed_at: DateTime<Utc>,
}

/// Aggregate counts for the deck view
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// All stored cards
    pub total_cards: i64,
    /// Cards due at or before the query time
    pub due_cards: i64,
    /// Cards never reviewed
    pub new_cards: i64,
    /// Configured sources
    pub sources: i64,
}

// ============================================================================
// STORE
// ============================================================================

const CARD_COLUMNS: &str = "c.hash, c.question, c.answer, c.context, c.stability, c.difficulty,
     c.due_at, c.last_reviewed, c.created_at, c.source_id, s.path";

/// Card and source store backed by SQLite.
pub struct Store {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl Store {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open (or create) a store.
    ///
    /// With no explicit path the database lives in the platform data
    /// directory, e.g. `~/.local/share/recall/recall.db` on Linux.
    pub fn open(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("dev", "recall", "recall").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;
                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("recall.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    /// Default data directory for auxiliary files (git mirrors).
    pub fn default_data_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "recall", "recall").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    // ------------------------------------------------------------------
    // Row mapping
    // ------------------------------------------------------------------

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    /// Convert a row (CARD_COLUMNS order) to a CardRecord
    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<CardRecord> {
        let due_at: String = row.get(6)?;
        let last_reviewed: Option<String> = row.get(7)?;
        let created_at: String = row.get(8)?;

        let last_reviewed = match last_reviewed {
            Some(s) => Some(Self::parse_timestamp(&s, "last_reviewed")?),
            None => None,
        };

        Ok(CardRecord {
            hash: row.get(0)?,
            question: row.get(1)?,
            answer: row.get(2)?,
            context: row.get(3)?,
            stability: row.get(4)?,
            difficulty: row.get(5)?,
            due_at: Self::parse_timestamp(&due_at, "due_at")?,
            last_reviewed,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            source_id: row.get(9)?,
            source_path: row.get(10)?,
        })
    }

    fn row_to_source(row: &rusqlite::Row) -> rusqlite::Result<SourceRecord> {
        let kind: String = row.get(2)?;
        let last_scanned: Option<String> = row.get(3)?;
        let last_scanned = match last_scanned {
            Some(s) => Some(Self::parse_timestamp(&s, "last_scanned")?),
            None => None,
        };

        Ok(SourceRecord {
            id: row.get(0)?,
            path: row.get(1)?,
            kind: SourceKind::parse_name(&kind),
            last_scanned,
        })
    }

    fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<ReviewLogRecord> {
        let rating: i64 = row.get(2)?;
        let rating = Rating::from_grade(rating as u8).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Integer,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Invalid rating {} in review log", rating),
                )),
            )
        })?;
        let reviewed_at: String = row.get(5)?;

        Ok(ReviewLogRecord {
            id: row.get(0)?,
            card_hash: row.get(1)?,
            rating,
            stability: row.get(3)?,
            difficulty: row.get(4)?,
            reviewed_at: Self::parse_timestamp(&reviewed_at, "reviewed_at")?,
        })
    }

    // ------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------

    /// Insert a newly discovered card.
    ///
    /// The card starts in the new state: stability and difficulty zero,
    /// due immediately, never reviewed. Inserting a hash that already
    /// exists is a constraint error; callers check with
    /// [`get_card`](Self::get_card) first during reconciliation.
    pub fn insert_card(&self, card: &Card, source_id: Option<i64>) -> Result<CardRecord> {
        let hash = card.hash();
        let now = Utc::now();

        {
            let writer = self.writer.lock()
                .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
            writer.execute(
                "INSERT INTO cards (hash, question, answer, context, stability, difficulty,
                                    due_at, last_reviewed, created_at, source_id)
                 VALUES (?1, ?2, ?3, ?4, 0.0, 0.0, ?5, NULL, ?6, ?7)",
                params![
                    hash,
                    card.question,
                    card.answer,
                    card.context,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                    source_id,
                ],
            )?;
        }

        self.get_card(&hash)?
            .ok_or(StorageError::CardNotFound(hash))
    }

    /// Get a card by content hash
    pub fn get_card(&self, hash: &str) -> Result<Option<CardRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             LEFT JOIN sources s ON c.source_id = s.id
             WHERE c.hash = ?1"
        ))?;

        let card = stmt
            .query_row(params![hash], Self::row_to_card)
            .optional()?;
        Ok(card)
    }

    /// All cards, earliest due first
    pub fn all_cards(&self) -> Result<Vec<CardRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             LEFT JOIN sources s ON c.source_id = s.id
             ORDER BY c.due_at ASC"
        ))?;

        let rows = stmt.query_map([], Self::row_to_card)?;
        let mut cards = Vec::new();
        for card in rows {
            cards.push(card?);
        }
        Ok(cards)
    }

    /// Cards due at or before `now`, earliest first
    pub fn due_cards(&self, now: DateTime<Utc>, limit: Option<usize>) -> Result<Vec<CardRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = reader.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             LEFT JOIN sources s ON c.source_id = s.id
             WHERE c.due_at <= ?1
             ORDER BY c.due_at ASC
             LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![now.to_rfc3339(), limit], Self::row_to_card)?;
        let mut cards = Vec::new();
        for card in rows {
            cards.push(card?);
        }
        Ok(cards)
    }

    /// Cards belonging to a source
    pub fn cards_for_source(&self, source_id: i64) -> Result<Vec<CardRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             LEFT JOIN sources s ON c.source_id = s.id
             WHERE c.source_id = ?1"
        ))?;

        let rows = stmt.query_map(params![source_id], Self::row_to_card)?;
        let mut cards = Vec::new();
        for card in rows {
            cards.push(card?);
        }
        Ok(cards)
    }

    /// Delete a card by hash. Returns whether a row was removed.
    pub fn delete_card(&self, hash: &str) -> Result<bool> {
        let writer = self.writer.lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let deleted = writer.execute("DELETE FROM cards WHERE hash = ?1", params![hash])?;
        Ok(deleted > 0)
    }

    /// Apply one review event to a card.
    ///
    /// The full read-modify-write cycle (load the current memory state,
    /// run the scheduler, persist the result plus a review-log entry)
    /// happens inside a single transaction on the writer connection, so
    /// two concurrent reviews of the same card serialize rather than
    /// clobbering each other.
    pub fn apply_review(
        &self,
        hash: &str,
        rating: Rating,
        scheduler: &Scheduler,
        now: DateTime<Utc>,
    ) -> Result<CardRecord> {
        {
            let mut writer = self.writer.lock()
                .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
            let tx = writer.transaction()?;

            let current = tx
                .query_row(
                    "SELECT stability, difficulty, last_reviewed FROM cards WHERE hash = ?1",
                    params![hash],
                    |row| {
                        let last_reviewed: Option<String> = row.get(2)?;
                        let last_reviewed = match last_reviewed {
                            Some(s) => Some(Self::parse_timestamp(&s, "last_reviewed")?),
                            None => None,
                        };
                        Ok(MemoryState {
                            stability: row.get(0)?,
                            difficulty: row.get(1)?,
                            last_reviewed,
                        })
                    },
                )
                .optional()?
                .ok_or_else(|| StorageError::CardNotFound(hash.to_string()))?;

            let next = scheduler.next_state(&current, rating, now);
            let due_at = scheduler.next_due_date(next.stability, now);

            tx.execute(
                "UPDATE cards
                 SET stability = ?1, difficulty = ?2, due_at = ?3, last_reviewed = ?4
                 WHERE hash = ?5",
                params![
                    next.stability,
                    next.difficulty,
                    due_at.to_rfc3339(),
                    now.to_rfc3339(),
                    hash,
                ],
            )?;

            tx.execute(
                "INSERT INTO review_log (card_hash, rating, stability, difficulty, reviewed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    hash,
                    rating.grade() as i64,
                    next.stability,
                    next.difficulty,
                    now.to_rfc3339(),
                ],
            )?;

            tx.commit()?;

            tracing::debug!(
                card = hash,
                rating = %rating,
                stability = next.stability,
                due = %due_at,
                "review applied"
            );
        }

        self.get_card(hash)?
            .ok_or_else(|| StorageError::CardNotFound(hash.to_string()))
    }

    /// Review history for a card, most recent first
    pub fn review_history(&self, hash: &str, limit: usize) -> Result<Vec<ReviewLogRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, card_hash, rating, stability, difficulty, reviewed_at
             FROM review_log
             WHERE card_hash = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![hash, limit as i64], Self::row_to_review)?;
        let mut reviews = Vec::new();
        for review in rows {
            reviews.push(review?);
        }
        Ok(reviews)
    }

    // ------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------

    /// Register a card source
    pub fn add_source(&self, path: &str, kind: SourceKind) -> Result<SourceRecord> {
        let id = {
            let writer = self.writer.lock()
                .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
            writer.execute(
                "INSERT INTO sources (path, kind, last_scanned) VALUES (?1, ?2, NULL)",
                params![path, kind.as_str()],
            )?;
            writer.last_insert_rowid()
        };

        self.get_source(id)?.ok_or(StorageError::SourceNotFound(id))
    }

    /// Get a source by id
    pub fn get_source(&self, id: i64) -> Result<Option<SourceRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, path, kind, last_scanned FROM sources WHERE id = ?1",
        )?;
        let source = stmt
            .query_row(params![id], Self::row_to_source)
            .optional()?;
        Ok(source)
    }

    /// Find a source by its path or URL
    pub fn find_source(&self, path: &str) -> Result<Option<SourceRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, path, kind, last_scanned FROM sources WHERE path = ?1",
        )?;
        let source = stmt
            .query_row(params![path], Self::row_to_source)
            .optional()?;
        Ok(source)
    }

    /// All registered sources
    pub fn sources(&self) -> Result<Vec<SourceRecord>> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, path, kind, last_scanned FROM sources ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_source)?;
        let mut sources = Vec::new();
        for source in rows {
            sources.push(source?);
        }
        Ok(sources)
    }

    /// Remove a source and every card that came from it.
    pub fn remove_source(&self, id: i64) -> Result<bool> {
        let mut writer = self.writer.lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction()?;

        // Cards first; review_log rows follow via ON DELETE CASCADE
        tx.execute("DELETE FROM cards WHERE source_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM sources WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Record that a source was just reconciled
    pub fn touch_scanned(&self, id: i64) -> Result<()> {
        let writer = self.writer.lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "UPDATE sources SET last_scanned = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Aggregate counts for the deck view
    pub fn stats(&self, now: DateTime<Utc>) -> Result<StoreStats> {
        let reader = self.reader.lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let total_cards: i64 =
            reader.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
        let due_cards: i64 = reader.query_row(
            "SELECT COUNT(*) FROM cards WHERE due_at <= ?1",
            params![now.to_rfc3339()],
            |row| row.get(0),
        )?;
        let new_cards: i64 = reader.query_row(
            "SELECT COUNT(*) FROM cards WHERE stability = 0.0",
            [],
            |row| row.get(0),
        )?;
        let sources: i64 =
            reader.query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))?;

        Ok(StoreStats {
            total_cards,
            due_cards,
            new_cards,
            sources,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
