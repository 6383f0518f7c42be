//! The NoteService: the transport-facing API for sealed notes.
//!
//! The service validates requests, reads the clock, and maps store results
//! onto the three logical calls a transport exposes (`create`, `retrieve`,
//! `precheck`) plus the `purge` trigger. It never sees plaintext or keys.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use blindnote_core::{ContentKind, NoteId, ViewPolicy};
use blindnote_store::{ConsumedNote, NewNote, NoteStore, StoreError};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError, ValidationError};
use crate::scheduler::{PurgeHandle, PurgeScheduler};

/// Lifecycle options chosen by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotePolicy {
    /// Minutes until expiry; `None` takes the configured default.
    pub ttl_minutes: Option<u32>,
    pub views: ViewPolicy,
    /// Informational pass-through so recipients know to ask for a passphrase.
    pub requires_passphrase: bool,
}

impl NotePolicy {
    /// Build a policy from the creation form's flags.
    pub fn from_flags(ttl_minutes: Option<u32>, one_time: bool, requires_passphrase: bool) -> Self {
        Self {
            ttl_minutes,
            views: ViewPolicy::from_one_time(one_time),
            requires_passphrase,
        }
    }

    /// A policy allowing exactly `max_views` retrievals.
    pub fn max_views(max_views: u32) -> std::result::Result<Self, ValidationError> {
        let limit = NonZeroU32::new(max_views).ok_or(ValidationError::ZeroViewLimit)?;
        Ok(Self {
            views: ViewPolicy::from_view_limit(Some(limit.get()))
                .unwrap_or(ViewPolicy::Limited(limit)),
            ..Self::default()
        })
    }

    pub fn ttl_minutes(mut self, minutes: u32) -> Self {
        self.ttl_minutes = Some(minutes);
        self
    }

    pub fn requires_passphrase(mut self, requires: bool) -> Self {
        self.requires_passphrase = requires;
        self
    }
}

/// A create request as it arrives from the transport.
#[derive(Debug, Clone)]
pub struct CreateNote {
    /// The sealed wire blob.
    pub ciphertext: Bytes,
    pub content_kind: ContentKind,
    pub policy: NotePolicy,
}

impl CreateNote {
    pub fn new(ciphertext: impl Into<Bytes>, policy: NotePolicy) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            content_kind: ContentKind::default(),
            policy,
        }
    }

    pub fn content_kind(mut self, kind: ContentKind) -> Self {
        self.content_kind = kind;
        self
    }
}

/// Returned by [`NoteService::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateResponse {
    pub id: NoteId,
    /// Unix milliseconds.
    pub expires_at: i64,
}

/// Returned by [`NoteService::retrieve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveResponse {
    pub ciphertext: Bytes,
    pub content_kind: ContentKind,
    pub requires_passphrase: bool,
    pub expires_at: i64,
    /// Views left after this one; `None` when unbounded.
    pub remaining_views: Option<u32>,
}

impl From<ConsumedNote> for RetrieveResponse {
    fn from(note: ConsumedNote) -> Self {
        Self {
            ciphertext: note.ciphertext,
            content_kind: note.content_kind,
            requires_passphrase: note.requires_passphrase,
            expires_at: note.expires_at,
            remaining_views: note.remaining_views,
        }
    }
}

/// Returned by [`NoteService::precheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecheckResponse {
    pub content_kind: ContentKind,
    pub requires_passphrase: bool,
    pub expires_at: i64,
}

/// The main service struct.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct NoteService<S: NoteStore> {
    store: Arc<S>,
    config: ServiceConfig,
    clock: Arc<dyn Clock>,
}

impl<S: NoteStore> NoteService<S> {
    /// Create a service over `store` using the wall clock.
    pub fn new(store: S, config: ServiceConfig) -> Result<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a service with an explicit time source.
    pub fn with_clock(store: S, config: ServiceConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(store),
            config,
            clock,
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Note Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate and persist a sealed note.
    ///
    /// Storage failures always surface; the sender must know when nothing
    /// was stored.
    pub async fn create(&self, request: CreateNote) -> Result<CreateResponse> {
        let ttl = self.validate_create(&request)?;

        let note = NewNote {
            ciphertext: request.ciphertext,
            content_kind: request.content_kind,
            requires_passphrase: request.policy.requires_passphrase,
            ttl,
            view_policy: request.policy.views,
        };

        let now = self.clock.now_millis();
        let created = self.bounded(self.store.create(note, now)).await?;

        debug!(
            note = %created.id.fingerprint(),
            kind = %request.content_kind,
            views = ?request.policy.views,
            "note created"
        );

        Ok(CreateResponse {
            id: created.id,
            expires_at: created.expires_at,
        })
    }

    /// Consume one view of a note and return its blob.
    ///
    /// Missing, expired, and used-up notes are all [`ServiceError::NotFound`].
    pub async fn retrieve(&self, id: &str) -> Result<RetrieveResponse> {
        let id = parse_id(id)?;
        let now = self.clock.now_millis();

        match self.bounded(self.store.fetch_and_consume(&id, now)).await? {
            Some(note) => {
                debug!(note = %id.fingerprint(), remaining = ?note.remaining_views, "note served");
                Ok(note.into())
            }
            None => Err(ServiceError::NotFound),
        }
    }

    /// Check that a note exists without consuming a view.
    pub async fn precheck(&self, id: &str) -> Result<PrecheckResponse> {
        let id = parse_id(id)?;
        let now = self.clock.now_millis();

        let meta = self
            .bounded(self.store.peek(&id, now))
            .await?
            .ok_or(ServiceError::NotFound)?;

        Ok(PrecheckResponse {
            content_kind: meta.content_kind,
            requires_passphrase: meta.requires_passphrase,
            expires_at: meta.expires_at,
        })
    }

    /// Delete every expired note. Returns the number removed.
    pub async fn purge(&self) -> Result<u64> {
        let now = self.clock.now_millis();
        let removed = self.bounded(self.store.purge_expired(now)).await?;
        debug!(removed, "purge complete");
        Ok(removed)
    }

    /// Number of stored rows, expired or not.
    pub async fn count(&self) -> Result<u64> {
        self.bounded(self.store.count()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn validate_create(&self, request: &CreateNote) -> Result<Duration> {
        let size = request.ciphertext.len();
        if size == 0 {
            return Err(ValidationError::EmptyCiphertext.into());
        }
        if size > self.config.max_ciphertext_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size,
                max: self.config.max_ciphertext_bytes,
            }
            .into());
        }

        let minutes = request
            .policy
            .ttl_minutes
            .unwrap_or(self.config.default_ttl_minutes);
        let (min, max) = (self.config.min_ttl_minutes, self.config.max_ttl_minutes);
        if !(min..=max).contains(&minutes) {
            return Err(ValidationError::TtlOutOfRange { minutes, min, max }.into());
        }

        Ok(Duration::from_secs(u64::from(minutes) * 60))
    }

    /// Run a store operation under the configured storage timeout.
    async fn bounded<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = blindnote_store::Result<T>>,
    {
        let limit = self.config.storage_timeout();
        match tokio::time::timeout(limit, op).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "store operation timed out");
                Err(StoreError::Timeout(limit).into())
            }
        }
    }
}

impl<S: NoteStore + 'static> NoteService<S> {
    /// Start the background purge at the configured interval.
    pub fn spawn_purge_scheduler(self: &Arc<Self>) -> PurgeHandle {
        PurgeScheduler::spawn(Arc::clone(self), self.config.purge_interval())
    }
}

fn parse_id(id: &str) -> Result<NoteId> {
    NoteId::from_hex(id).map_err(|_| ValidationError::MalformedId.into())
}
