//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::{Connection, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::traits::now_millis;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely,
/// including from several connections racing on one fresh file. The version
/// check and the migrations share one IMMEDIATE transaction, so only the
/// first writer applies anything.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = tx.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current, CURRENT_VERSION
        )));
    }

    for version in (current + 1)..=CURRENT_VERSION {
        apply_migration(&tx, version)?;

        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![version, now_millis()],
        )?;
    }

    tx.commit()?;
    if current < CURRENT_VERSION {
        tracing::debug!(from = current, to = CURRENT_VERSION, "schema migrated");
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per sealed note. Rows are hard-deleted; nothing is tombstoned.
        CREATE TABLE notes (
            id TEXT PRIMARY KEY,                  -- 32 hex chars, 128 random bits
            ciphertext BLOB NOT NULL,             -- CBOR sealed envelope, opaque here
            content_kind TEXT NOT NULL DEFAULT 'password',
            requires_passphrase INTEGER NOT NULL DEFAULT 0,
            expires_at INTEGER NOT NULL,          -- Unix ms, immutable
            view_limit INTEGER,                   -- NULL = unlimited, 1 = one-time
            views_consumed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL           -- Unix ms, informational
        );

        -- Purge scans
        CREATE INDEX idx_notes_expires_at ON notes(expires_at);
        "#,
    )?;

    Ok(())
}
