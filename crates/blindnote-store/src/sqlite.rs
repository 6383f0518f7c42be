//! SQLite implementation of the NoteStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking and bounded by
//! tokio::time::timeout.
//!
//! Consumption runs inside an IMMEDIATE transaction and finishes with a
//! conditional DELETE/UPDATE keyed on the observed view count. The
//! in-process mutex serializes callers sharing one store; the write lock
//! and the conditional statement keep the single-winner guarantee when
//! several processes share one database file.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blindnote_core::{ContentKind, NoteId, ViewPolicy};
use bytes::Bytes;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    ConsumedNote, CreatedNote, NewNote, NoteMeta, NoteStore, StoredNote, MAX_ID_ATTEMPTS,
};

/// Tuning for [`SqliteStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Upper bound on any single store operation.
    pub op_timeout: Duration,
    /// How long SQLite waits on a lock held by another connection.
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(2),
        }
    }
}

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open a database file with explicit tuning.
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(config.busy_timeout)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "opened note database");
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: StoreConfig::default(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run a blocking operation on the connection, bounded by `op_timeout`.
    ///
    /// If the bound elapses the caller gets [`StoreError::Timeout`]; the
    /// blocking work itself may still commit afterwards.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        });

        match tokio::time::timeout(self.config.op_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StoreError::Unavailable(format!(
                "spawn_blocking failed: {}",
                e
            ))),
            Err(_) => {
                tracing::warn!(timeout = ?self.config.op_timeout, "store operation timed out");
                Err(StoreError::Timeout(self.config.op_timeout))
            }
        }
    }
}

// Helper to convert a row to StoredNote
fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredNote> {
    let ciphertext: Vec<u8> = row.get("ciphertext")?;
    let content_kind: String = row.get("content_kind")?;
    let view_limit: Option<i64> = row.get("view_limit")?;
    let views_consumed: i64 = row.get("views_consumed")?;

    let content_kind = content_kind.parse::<ContentKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let view_limit = view_limit
        .map(u32::try_from)
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Integer,
                Box::new(e),
            )
        })?;
    let view_policy = ViewPolicy::from_view_limit(view_limit).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(5, "view_limit".into(), rusqlite::types::Type::Integer)
    })?;

    Ok(StoredNote {
        ciphertext: Bytes::from(ciphertext),
        content_kind,
        requires_passphrase: row.get("requires_passphrase")?,
        expires_at: row.get("expires_at")?,
        created_at: row.get("created_at")?,
        view_policy,
        views_consumed: u32::try_from(views_consumed).unwrap_or(u32::MAX),
    })
}

const SELECT_NOTE: &str = "SELECT ciphertext, content_kind, requires_passphrase, expires_at,
        created_at, view_limit, views_consumed
     FROM notes WHERE id = ?1";

/// Rows that exist but can't be decoded are corrupt, not a driver fault.
fn read_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StoreError::InvalidData(err.to_string())
        }
        other => other.into(),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl NoteStore for SqliteStore {
    async fn create(&self, note: NewNote, now: i64) -> Result<CreatedNote> {
        let row = StoredNote::from_new(note, now);

        self.run(move |conn| {
            for attempt in 1..=MAX_ID_ATTEMPTS {
                let id = NoteId::generate();
                let inserted = conn.execute(
                    "INSERT INTO notes (
                        id, ciphertext, content_kind, requires_passphrase,
                        expires_at, view_limit, views_consumed, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                    params![
                        id.to_hex(),
                        row.ciphertext.as_ref(),
                        row.content_kind.as_str(),
                        row.requires_passphrase,
                        row.expires_at,
                        row.view_policy.view_limit(),
                        row.created_at,
                    ],
                );

                match inserted {
                    Ok(_) => {
                        tracing::debug!(
                            note = %id.fingerprint(),
                            expires_at = row.expires_at,
                            "note created"
                        );
                        return Ok(CreatedNote {
                            id,
                            expires_at: row.expires_at,
                        });
                    }
                    Err(e) if is_unique_violation(&e) => {
                        tracing::warn!(attempt, "note id collision, drawing a new id");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(StoreError::IdExhausted(MAX_ID_ATTEMPTS))
        })
        .await
    }

    async fn peek(&self, id: &NoteId, now: i64) -> Result<Option<NoteMeta>> {
        let id = *id;

        self.run(move |conn| {
            let note = conn
                .query_row(SELECT_NOTE, params![id.to_hex()], row_to_note)
                .optional()
                .map_err(read_error)?;

            let Some(note) = note else {
                return Ok(None);
            };

            if note.is_expired(now) {
                let removed = conn.execute(
                    "DELETE FROM notes WHERE id = ?1 AND expires_at <= ?2",
                    params![id.to_hex(), now],
                )?;
                tracing::debug!(note = %id.fingerprint(), removed, "expired note removed on peek");
                return Ok(None);
            }

            Ok(note.is_visible(now).then(|| note.meta()))
        })
        .await
    }

    async fn fetch_and_consume(&self, id: &NoteId, now: i64) -> Result<Option<ConsumedNote>> {
        let id = *id;

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let note = tx
                .query_row(SELECT_NOTE, params![id.to_hex()], row_to_note)
                .optional()
                .map_err(read_error)?;

            // Dropping `tx` on any early return rolls back; nothing was written.
            let Some(note) = note else {
                return Ok(None);
            };
            if !note.is_visible(now) {
                return Ok(None);
            }

            let changed = if note.view_policy.is_last_view(note.views_consumed) {
                tx.execute(
                    "DELETE FROM notes WHERE id = ?1 AND views_consumed = ?2",
                    params![id.to_hex(), note.views_consumed],
                )?
            } else {
                tx.execute(
                    "UPDATE notes SET views_consumed = views_consumed + 1
                     WHERE id = ?1 AND views_consumed = ?2",
                    params![id.to_hex(), note.views_consumed],
                )?
            };

            if changed != 1 {
                tracing::warn!(note = %id.fingerprint(), "lost consume race");
                return Ok(None);
            }

            tx.commit()?;

            let consumed = note.consumed();
            tracing::debug!(
                note = %id.fingerprint(),
                remaining = ?consumed.remaining_views,
                "note view consumed"
            );
            Ok(Some(consumed))
        })
        .await
    }

    async fn purge_expired(&self, now: i64) -> Result<u64> {
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM notes WHERE expires_at <= ?1", params![now])?;
            Ok(removed as u64)
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
