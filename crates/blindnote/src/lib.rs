//! # Blindnote
//!
//! One-time encrypted notes with zero-knowledge storage.
//!
//! ## Overview
//!
//! A sender seals a structured secret on their own machine, uploads only
//! the wire blob, and hands the recipient a link whose fragment carries the
//! base secret. The server side, this crate's [`NoteService`], stores blobs
//! it can't read and hands each one out at most as many times as its
//! [`ViewPolicy`] allows.
//!
//! - **Create**: validate size and lifetime, store, return the id
//! - **Retrieve**: consume one view atomically; the last view deletes the note
//! - **Precheck**: metadata for the recipient's UI, consuming nothing
//! - **Purge**: reclaim expired rows, on demand or via [`PurgeScheduler`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blindnote::core::{open, seal, SecretPayload, ShareLink};
//! use blindnote::store::SqliteStore;
//! use blindnote::{CreateNote, NotePolicy, NoteService, ServiceConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::default();
//!     let store = SqliteStore::open_with_config("notes.db", config.store_config())?;
//!     let service = NoteService::new(store, config)?;
//!
//!     // Sender side
//!     let payload = SecretPayload::new("prod key").with_field("API Key", "sk-test-123");
//!     let sealed = seal(&payload, None)?;
//!     let created = service
//!         .create(CreateNote::new(sealed.wire_blob, NotePolicy::default()))
//!         .await?;
//!     let url = ShareLink::new(created.id, sealed.base_secret).to_url("https://notes.example");
//!
//!     // Recipient side
//!     let link = ShareLink::parse(&url)?;
//!     let note = service.retrieve(&link.note_id.to_hex()).await?;
//!     let opened = open(&note.ciphertext, &link.base_secret, None)?;
//!     assert_eq!(opened, payload);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `blindnote::core` - Keys, envelopes, payloads, links
//! - `blindnote::store` - Storage abstraction, SQLite and in-memory backends

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod service;

pub use blindnote_core as core;
pub use blindnote_store as store;

pub use clock::{Clock, SystemClock};
pub use config::ServiceConfig;
pub use error::{open_failure_message, Result, ServiceError, ValidationError, GONE_OR_WRONG_KEY};
pub use scheduler::{PurgeHandle, PurgeScheduler};
pub use service::{
    CreateNote, CreateResponse, NotePolicy, NoteService, PrecheckResponse, RetrieveResponse,
};

pub use blindnote_core::{ContentKind, NoteId, ViewPolicy};
