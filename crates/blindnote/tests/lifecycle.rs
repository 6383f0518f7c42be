//! End-to-end note lifecycle: seal on the sender, store, retrieve and open
//! on the recipient, against both store backends.

use std::sync::Arc;
use std::time::Duration;

use blindnote::core::{open, seal, CoreError, ShareLink};
use blindnote::{
    open_failure_message, Clock, CreateNote, NotePolicy, ServiceConfig, ServiceError,
    GONE_OR_WRONG_KEY,
};
use blindnote_testkit::{
    api_key_payload, login_payload, numbered_payload, TestFixture, TEST_ORIGIN,
};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[tokio::test]
async fn test_one_time_api_key_scenario() {
    init_tracing();
    let fixture = TestFixture::new();
    let payload = api_key_payload();

    let sealed = seal(&payload, None).unwrap();
    assert!(!sealed.requires_passphrase);

    let created = fixture
        .service
        .create(CreateNote::new(
            sealed.wire_blob.clone(),
            NotePolicy::from_flags(Some(60), true, false),
        ))
        .await
        .unwrap();
    let id = created.id.to_hex();
    assert_eq!(id.len(), 32);

    let note = fixture.service.retrieve(&id).await.unwrap();
    assert_eq!(note.ciphertext.as_ref(), sealed.wire_blob.as_slice());
    assert_eq!(note.remaining_views, Some(0));

    let opened = open(&note.ciphertext, &sealed.base_secret, None).unwrap();
    assert_eq!(opened, payload);
    assert_eq!(opened.fields["API Key"], "sk-test-123");
    assert_eq!(opened.notes, "prod key");

    let second = fixture.service.retrieve(&id).await;
    assert!(matches!(second, Err(ServiceError::NotFound)));
    assert_eq!(fixture.service.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_multi_view_bound() {
    init_tracing();
    let fixture = TestFixture::new();
    let (_, link) = fixture
        .send(&login_payload(), None, NotePolicy::max_views(3).unwrap())
        .await;
    let id = link.note_id.to_hex();

    let mut remaining = Vec::new();
    for _ in 0..3 {
        remaining.push(fixture.service.retrieve(&id).await.unwrap().remaining_views);
    }
    assert_eq!(remaining, vec![Some(2), Some(1), Some(0)]);

    assert!(matches!(fixture.service.retrieve(&id).await, Err(ServiceError::NotFound)));
}

#[tokio::test]
async fn test_unlimited_until_expiry() {
    let fixture = TestFixture::new();
    let (created, link) = fixture
        .send(&login_payload(), None, NotePolicy::from_flags(Some(15), false, false))
        .await;

    for _ in 0..10 {
        assert!(fixture.receive(&link, None).await.is_some());
    }

    fixture.clock.set(created.expires_at - 1);
    assert!(fixture.receive(&link, None).await.is_some());

    fixture.clock.set(created.expires_at);
    assert!(fixture.receive(&link, None).await.is_none());
}

#[tokio::test]
async fn test_expiry_is_enforced_before_purge() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let fixture = TestFixture::sqlite(dir.path().join("notes.db"));

    let (_, one_time) = fixture.send(&numbered_payload(1), None, NotePolicy::default()).await;
    let (_, peeked) = fixture.send(&numbered_payload(2), None, NotePolicy::default()).await;
    fixture.clock.advance(Duration::from_secs(61 * 60));

    let retrieve = fixture.service.retrieve(&one_time.note_id.to_hex()).await;
    assert!(matches!(retrieve, Err(ServiceError::NotFound)));
    let precheck = fixture.service.precheck(&peeked.note_id.to_hex()).await;
    assert!(matches!(precheck, Err(ServiceError::NotFound)));

    // The failed retrieve left its row; the precheck removed its own.
    assert_eq!(fixture.service.count().await.unwrap(), 1);
    assert_eq!(fixture.service.purge().await.unwrap(), 1);
    assert_eq!(fixture.service.purge().await.unwrap(), 0);
}

#[tokio::test]
async fn test_purge_keeps_live_notes() {
    let fixture = TestFixture::new();
    fixture
        .send(&numbered_payload(1), None, NotePolicy::default().ttl_minutes(15))
        .await;
    fixture
        .send(&numbered_payload(2), None, NotePolicy::default().ttl_minutes(15))
        .await;
    let (_, survivor) = fixture
        .send(&numbered_payload(3), None, NotePolicy::default().ttl_minutes(120))
        .await;

    fixture.clock.advance(Duration::from_secs(30 * 60));
    assert_eq!(fixture.service.purge().await.unwrap(), 2);
    assert_eq!(fixture.service.purge().await.unwrap(), 0);

    assert_eq!(fixture.receive(&survivor, None).await, Some(numbered_payload(3)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_retrieve_single_winner() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let fixture = TestFixture::sqlite(dir.path().join("race.db"));
    let (_, link) = fixture.send(&api_key_payload(), None, NotePolicy::default()).await;
    let id = Arc::new(link.note_id.to_hex());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&fixture.service);
            let id = Arc::clone(&id);
            tokio::spawn(async move { service.retrieve(&id).await })
        })
        .collect();

    let mut served = 0;
    let mut not_found = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => served += 1,
            Err(ServiceError::NotFound) => not_found += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(served, 1);
    assert_eq!(not_found, 15);
    assert!(matches!(fixture.service.retrieve(&id).await, Err(ServiceError::NotFound)));
}

#[tokio::test]
async fn test_passphrase_flow() {
    let fixture = TestFixture::new();
    let payload = login_payload();
    let (_, link) = fixture
        .send(&payload, Some("hunter2"), NotePolicy::from_flags(None, false, false))
        .await;
    let id = link.note_id.to_hex();

    let meta = fixture.service.precheck(&id).await.unwrap();
    assert!(meta.requires_passphrase);

    let note = fixture.service.retrieve(&id).await.unwrap();
    let wrong = open(&note.ciphertext, &link.base_secret, Some("hunter3")).unwrap_err();
    let missing = open(&note.ciphertext, &link.base_secret, None).unwrap_err();
    assert_eq!(wrong, CoreError::AuthenticationFailure);
    assert_eq!(missing, CoreError::AuthenticationFailure);
    assert_eq!(open_failure_message(&wrong), GONE_OR_WRONG_KEY);

    assert_eq!(fixture.receive(&link, Some("hunter2")).await, Some(payload));
}

#[tokio::test]
async fn test_share_link_keeps_secret_out_of_requests() {
    let fixture = TestFixture::new();
    let (created, link) = fixture.send(&api_key_payload(), None, NotePolicy::default()).await;

    let url = link.to_url(TEST_ORIGIN);
    let secret = link.base_secret.to_base64url();
    assert!(url.starts_with(TEST_ORIGIN));
    assert!(url.ends_with(&format!("#{}", secret)));

    let path = link.request_path();
    assert_eq!(path, format!("/view/{}", created.id));
    assert!(!path.contains(&secret));

    let parsed = ShareLink::parse(&url).unwrap();
    assert_eq!(parsed, link);
    assert_eq!(fixture.receive(&parsed, None).await, Some(api_key_payload()));
}

#[tokio::test]
async fn test_wrong_base_secret_reads_like_gone() {
    let fixture = TestFixture::new();
    let (_, link) = fixture.send(&api_key_payload(), None, NotePolicy::default()).await;
    let other = seal(&api_key_payload(), None).unwrap();

    let note = fixture.service.retrieve(&link.note_id.to_hex()).await.unwrap();
    let err = open(&note.ciphertext, &other.base_secret, None).unwrap_err();

    assert_eq!(open_failure_message(&err), ServiceError::NotFound.public_message());
}

#[tokio::test]
async fn test_config_from_json() {
    let config: ServiceConfig = serde_json::from_str(
        r#"{
            "min_ttl_minutes": 5,
            "max_ttl_minutes": 120,
            "default_ttl_minutes": 30,
            "max_ciphertext_bytes": 1024
        }"#,
    )
    .unwrap();
    assert_eq!(config.storage_timeout_ms, 5_000);

    let fixture = TestFixture::with_config(config);
    let created = fixture
        .service
        .create(CreateNote::new(vec![1u8; 1024], NotePolicy::default()))
        .await
        .unwrap();
    assert_eq!(created.expires_at, fixture.clock.now_millis() + 30 * 60 * 1000);

    let too_big = fixture
        .service
        .create(CreateNote::new(vec![1u8; 1025], NotePolicy::default()))
        .await;
    assert!(matches!(too_big, Err(ServiceError::Validation(_))));

    let bad: ServiceConfig = serde_json::from_str(r#"{ "default_ttl_minutes": 1 }"#).unwrap();
    assert!(matches!(bad.validate(), Err(ServiceError::InvalidConfig(_))));
}
