//! # Blindnote Testkit
//!
//! Testing utilities for Blindnote.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A service over a memory or SQLite store, wired to a manual clock
//! - **Generators**: Proptest strategies for payloads, passphrases, and policies
//! - **ManualClock**: Drive expiry without sleeping
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use blindnote_testkit::generators::{maybe_passphrase, secret_payload};
//!
//! proptest! {
//!     #[test]
//!     fn seal_open_round_trip(payload in secret_payload(4), pass in maybe_passphrase()) {
//!         let sealed = blindnote_core::seal(&payload, pass.as_deref()).unwrap();
//!         let opened =
//!             blindnote_core::open(&sealed.wire_blob, &sealed.base_secret, pass.as_deref())
//!                 .unwrap();
//!         prop_assert_eq!(opened, payload);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use blindnote::NotePolicy;
//! use blindnote_testkit::fixtures::{api_key_payload, TestFixture};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let fixture = TestFixture::new();
//! let (_, link) = fixture.send(&api_key_payload(), None, NotePolicy::default()).await;
//! assert!(fixture.receive(&link, None).await.is_some());
//! # });
//! ```

pub mod clock;
pub mod fixtures;
pub mod generators;

pub use clock::{ManualClock, EPOCH_MS};
pub use fixtures::{api_key_payload, login_payload, numbered_payload, TestFixture, TEST_ORIGIN};
