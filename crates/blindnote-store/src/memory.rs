//! In-memory implementation of the NoteStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use blindnote_core::NoteId;

use crate::error::{Result, StoreError};
use crate::traits::{
    ConsumedNote, CreatedNote, NewNote, NoteMeta, NoteStore, StoredNote, MAX_ID_ATTEMPTS,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// every check-and-mutate runs under the write lock.
#[derive(Default)]
pub struct MemoryStore {
    notes: RwLock<HashMap<NoteId, StoredNote>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<NoteId, StoredNote>>> {
        self.notes
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<NoteId, StoredNote>>> {
        self.notes
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create(&self, note: NewNote, now: i64) -> Result<CreatedNote> {
        let stored = StoredNote::from_new(note, now);
        let mut notes = self.write()?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = NoteId::generate();
            if let Entry::Vacant(slot) = notes.entry(id) {
                let expires_at = stored.expires_at;
                slot.insert(stored);
                return Ok(CreatedNote { id, expires_at });
            }
        }

        Err(StoreError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    async fn peek(&self, id: &NoteId, now: i64) -> Result<Option<NoteMeta>> {
        {
            let notes = self.read()?;
            match notes.get(id) {
                None => return Ok(None),
                Some(note) if !note.is_expired(now) => {
                    return Ok(note.is_visible(now).then(|| note.meta()));
                }
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock before removing.
        let mut notes = self.write()?;
        if notes.get(id).is_some_and(|note| note.is_expired(now)) {
            notes.remove(id);
        }
        Ok(None)
    }

    async fn fetch_and_consume(&self, id: &NoteId, now: i64) -> Result<Option<ConsumedNote>> {
        let mut notes = self.write()?;

        let Some(note) = notes.get_mut(id) else {
            return Ok(None);
        };
        if !note.is_visible(now) {
            return Ok(None);
        }

        let consumed = note.consumed();
        if note.view_policy.is_last_view(note.views_consumed) {
            notes.remove(id);
        } else {
            note.views_consumed = note.views_consumed.saturating_add(1);
        }

        Ok(Some(consumed))
    }

    async fn purge_expired(&self, now: i64) -> Result<u64> {
        let mut notes = self.write()?;
        let before = notes.len();
        notes.retain(|_, note| !note.is_expired(now));
        Ok((before - notes.len()) as u64)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }
}
