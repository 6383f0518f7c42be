//! NoteStore trait: the abstract interface for sealed-note persistence.
//!
//! Implementations include SQLite (primary) and in-memory (for tests).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use blindnote_core::{ContentKind, NoteId, ViewPolicy};
use bytes::Bytes;

use crate::error::Result;

/// Attempts at drawing a fresh id before `create` gives up.
pub const MAX_ID_ATTEMPTS: u32 = 8;

/// A note to be stored.
#[derive(Debug, Clone)]
pub struct NewNote {
    /// The sealed wire blob. Opaque to the store.
    pub ciphertext: Bytes,
    pub content_kind: ContentKind,
    /// Informational pass-through for pre-flight clients.
    pub requires_passphrase: bool,
    /// Lifetime from creation.
    pub ttl: Duration,
    pub view_policy: ViewPolicy,
}

impl NewNote {
    /// Absolute expiry for a note created at `now`.
    pub fn expires_at(&self, now: i64) -> i64 {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        now.saturating_add(ttl_ms)
    }
}

/// Result of a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedNote {
    pub id: NoteId,
    pub expires_at: i64,
}

/// Read-only view of a note, as returned by [`NoteStore::peek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteMeta {
    pub content_kind: ContentKind,
    pub requires_passphrase: bool,
    pub expires_at: i64,
}

/// A note served by [`NoteStore::fetch_and_consume`].
///
/// `ciphertext` is the blob as it was before the view was consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedNote {
    pub ciphertext: Bytes,
    pub content_kind: ContentKind,
    pub requires_passphrase: bool,
    pub expires_at: i64,
    /// Views left after this one; `None` when unbounded.
    pub remaining_views: Option<u32>,
}

/// A persisted note row.
#[derive(Debug, Clone)]
pub struct StoredNote {
    pub ciphertext: Bytes,
    pub content_kind: ContentKind,
    pub requires_passphrase: bool,
    pub expires_at: i64,
    pub created_at: i64,
    pub view_policy: ViewPolicy,
    pub views_consumed: u32,
}

impl StoredNote {
    /// Build the row for a new note created at `now`.
    pub fn from_new(note: NewNote, now: i64) -> Self {
        Self {
            expires_at: note.expires_at(now),
            ciphertext: note.ciphertext,
            content_kind: note.content_kind,
            requires_passphrase: note.requires_passphrase,
            created_at: now,
            view_policy: note.view_policy,
            views_consumed: 0,
        }
    }

    /// Expired notes are invisible from the expiry instant onwards.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// A note is visible iff it is unexpired and has views left.
    pub fn is_visible(&self, now: i64) -> bool {
        !self.is_expired(now) && self.view_policy.allows_view(self.views_consumed)
    }

    pub fn meta(&self) -> NoteMeta {
        NoteMeta {
            content_kind: self.content_kind,
            requires_passphrase: self.requires_passphrase,
            expires_at: self.expires_at,
        }
    }

    /// What a consumer receives for the view numbered `views_consumed + 1`.
    pub fn consumed(&self) -> ConsumedNote {
        let served = self.views_consumed.saturating_add(1);
        ConsumedNote {
            ciphertext: self.ciphertext.clone(),
            content_kind: self.content_kind,
            requires_passphrase: self.requires_passphrase,
            expires_at: self.expires_at,
            remaining_views: self
                .view_policy
                .view_limit()
                .map(|limit| limit.saturating_sub(served)),
        }
    }
}

/// The NoteStore trait: async interface for sealed-note persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// Every method takes `now` (Unix ms) so expiry is decided by the caller's
/// clock, not the backend's.
///
/// # Guarantees
///
/// - **Single winner**: for a note with one view left, concurrent
///   `fetch_and_consume` calls see exactly one `Some`.
/// - **Uniform absence**: missing, expired, and used-up notes all read as
///   `None`; nothing distinguishes them.
/// - **Read-time expiry**: `peek` and `fetch_and_consume` never serve an
///   expired note, whether or not a purge has run.
/// - **No tombstones**: a deleted note leaves nothing behind.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist a note under a freshly allocated id.
    async fn create(&self, note: NewNote, now: i64) -> Result<CreatedNote>;

    /// Metadata check that does not consume a view.
    ///
    /// An expired row reads as `None` and is opportunistically deleted.
    async fn peek(&self, id: &NoteId, now: i64) -> Result<Option<NoteMeta>>;

    /// Atomically check and consume one view.
    ///
    /// On success the view counter is bumped, or the row is deleted if
    /// this was the last permitted view. When any check fails nothing is
    /// mutated and `None` is returned.
    async fn fetch_and_consume(&self, id: &NoteId, now: i64) -> Result<Option<ConsumedNote>>;

    /// Delete every note whose expiry is at or before `now`.
    ///
    /// Returns the number of rows removed. Idempotent.
    async fn purge_expired(&self, now: i64) -> Result<u64>;

    /// Number of stored rows, expired or not.
    async fn count(&self) -> Result<u64>;
}

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn stored(policy: ViewPolicy, consumed: u32) -> StoredNote {
        StoredNote {
            ciphertext: Bytes::from_static(b"blob"),
            content_kind: ContentKind::Password,
            requires_passphrase: false,
            expires_at: 1_000,
            created_at: 0,
            view_policy: policy,
            views_consumed: consumed,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let note = stored(ViewPolicy::OneTime, 0);
        assert!(note.is_visible(999));
        assert!(!note.is_visible(1_000));
        assert!(!note.is_visible(1_001));
    }

    #[test]
    fn test_visibility_follows_views() {
        assert!(!stored(ViewPolicy::OneTime, 1).is_visible(0));
        assert!(stored(ViewPolicy::Unlimited, 1_000_000).is_visible(0));
    }

    #[test]
    fn test_remaining_views() {
        let three = ViewPolicy::Limited(NonZeroU32::new(3).unwrap());
        assert_eq!(stored(three, 0).consumed().remaining_views, Some(2));
        assert_eq!(stored(three, 2).consumed().remaining_views, Some(0));
        assert_eq!(stored(ViewPolicy::OneTime, 0).consumed().remaining_views, Some(0));
        assert_eq!(stored(ViewPolicy::Unlimited, 5).consumed().remaining_views, None);
    }

    #[test]
    fn test_expires_at_saturates() {
        let note = NewNote {
            ciphertext: Bytes::new(),
            content_kind: ContentKind::Custom,
            requires_passphrase: false,
            ttl: Duration::from_secs(60),
            view_policy: ViewPolicy::OneTime,
        };
        assert_eq!(note.expires_at(1_000), 61_000);
        assert_eq!(note.expires_at(i64::MAX - 1), i64::MAX);
    }
}
