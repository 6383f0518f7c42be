//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a service over a chosen store,
//! a hand-driven clock, and the sender and recipient halves of the flow.

use std::path::Path;
use std::sync::Arc;

use blindnote::core::{open, seal, SecretPayload, ShareLink};
use blindnote::store::{MemoryStore, NoteStore, SqliteStore};
use blindnote::{CreateNote, CreateResponse, NotePolicy, NoteService, ServiceConfig};

use crate::clock::ManualClock;

/// Origin used when rendering share links in tests.
pub const TEST_ORIGIN: &str = "https://notes.test";

/// A service wired to a [`ManualClock`].
pub struct TestFixture<S: NoteStore = MemoryStore> {
    pub service: Arc<NoteService<S>>,
    pub clock: Arc<ManualClock>,
}

impl TestFixture<MemoryStore> {
    /// A fixture over an in-memory store with default configuration.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }
}

impl TestFixture<SqliteStore> {
    /// A fixture over a SQLite file at `path`.
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        let config = ServiceConfig::default();
        let store = SqliteStore::open_with_config(path, config.store_config())
            .expect("failed to open sqlite store");
        Self::with_store(store, config)
    }
}

impl<S: NoteStore> TestFixture<S> {
    pub fn with_store(store: S, config: ServiceConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let service = NoteService::with_clock(store, config, clock.clone())
            .expect("fixture config must be valid");
        Self {
            service: Arc::new(service),
            clock,
        }
    }

    /// Seal `payload` client-side and store it; returns the share link.
    pub async fn send(
        &self,
        payload: &SecretPayload,
        passphrase: Option<&str>,
        policy: NotePolicy,
    ) -> (CreateResponse, ShareLink) {
        let sealed = seal(payload, passphrase).expect("sealing failed");
        let policy = policy.requires_passphrase(sealed.requires_passphrase);
        let created = self
            .service
            .create(CreateNote::new(sealed.wire_blob, policy))
            .await
            .expect("create failed");
        (created, ShareLink::new(created.id, sealed.base_secret))
    }

    /// Retrieve and open a note the way a recipient would.
    ///
    /// `None` covers every failure: gone, expired, or wrong key.
    pub async fn receive(
        &self,
        link: &ShareLink,
        passphrase: Option<&str>,
    ) -> Option<SecretPayload> {
        let note = self.service.retrieve(&link.note_id.to_hex()).await.ok()?;
        open(&note.ciphertext, &link.base_secret, passphrase).ok()
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

/// The credential used throughout the end-to-end scenarios.
pub fn api_key_payload() -> SecretPayload {
    SecretPayload::new("prod key")
        .with_field("API Key", "sk-test-123")
        .created_at(crate::clock::EPOCH_MS)
}

/// A login with username and password fields.
pub fn login_payload() -> SecretPayload {
    SecretPayload::new("")
        .with_field("username", "ops@example.com")
        .with_field("password", "correct horse battery staple")
        .created_at(crate::clock::EPOCH_MS)
}

/// A numbered payload, for tests that need many distinct notes.
pub fn numbered_payload(n: usize) -> SecretPayload {
    SecretPayload::new(format!("note {}", n))
        .with_field("token", format!("tok-{:04}", n))
        .created_at(crate::clock::EPOCH_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fixture_round_trip() {
        let fixture = TestFixture::new();
        let payload = api_key_payload();

        let (_, link) = fixture.send(&payload, None, NotePolicy::default()).await;

        assert_eq!(fixture.receive(&link, None).await, Some(payload));
        assert_eq!(fixture.receive(&link, None).await, None);
    }

    #[tokio::test]
    async fn test_fixture_clock_drives_expiry() {
        let fixture = TestFixture::new();
        let (created, link) = fixture
            .send(&login_payload(), None, NotePolicy::default().ttl_minutes(15))
            .await;

        let now = fixture.clock.advance(Duration::from_secs(15 * 60));
        assert_eq!(now, created.expires_at);
        assert_eq!(fixture.receive(&link, None).await, None);
    }

    #[test]
    fn test_numbered_payloads_differ() {
        assert_ne!(numbered_payload(1), numbered_payload(2));
    }
}
