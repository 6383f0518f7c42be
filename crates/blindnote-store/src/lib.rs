//! # Blindnote Store
//!
//! Storage abstraction for sealed notes. Provides a trait-based interface
//! with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The [`NoteStore`] trait owns the lifecycle guarantees: a note is served
//! to at most as many readers as its [`ViewPolicy`](blindnote_core::ViewPolicy)
//! allows, never after it expires, and is hard-deleted when used up.
//!
//! ## Key Types
//!
//! - [`NoteStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`NewNote`] / [`NoteMeta`] / [`ConsumedNote`] - inputs and outputs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use blindnote_core::{ContentKind, ViewPolicy};
//! use blindnote_store::{now_millis, NewNote, NoteStore, SqliteStore};
//!
//! async fn example() -> blindnote_store::Result<()> {
//!     let store = SqliteStore::open("notes.db")?;
//!
//!     let created = store
//!         .create(
//!             NewNote {
//!                 ciphertext: b"sealed bytes".to_vec().into(),
//!                 content_kind: ContentKind::Password,
//!                 requires_passphrase: false,
//!                 ttl: Duration::from_secs(3600),
//!                 view_policy: ViewPolicy::OneTime,
//!             },
//!             now_millis(),
//!         )
//!         .await?;
//!
//!     let note = store.fetch_and_consume(&created.id, now_millis()).await?;
//!     assert!(note.is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Absence is not an error**: missing, expired, and consumed notes are `Ok(None)`
//! - **Read-time expiry**: purges are a safety net, never the enforcement point
//! - **Bounded operations**: SQLite calls time out with [`StoreError::Timeout`]

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreConfig};
pub use traits::{
    now_millis, ConsumedNote, CreatedNote, NewNote, NoteMeta, NoteStore, StoredNote,
    MAX_ID_ATTEMPTS,
};
