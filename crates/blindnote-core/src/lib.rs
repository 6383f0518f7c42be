//! # Blindnote Core
//!
//! Pure primitives for Blindnote: note identifiers, view policies, key
//! derivation, sealed envelopes, and share links.
//!
//! This crate contains no I/O, no storage, no networking. Everything a
//! sender or recipient does locally lives here; the server never links it
//! for anything beyond the shared types.
//!
//! ## Key Types
//!
//! - [`BaseSecret`] - 256 random bits, carried in the link fragment
//! - [`SymmetricKey`] - derived from the base secret and optional passphrase
//! - [`SealedEnvelope`] - nonce + ciphertext + tag, the stored blob
//! - [`SecretPayload`] - the structured plaintext
//! - [`NoteId`] / [`ViewPolicy`] / [`ContentKind`] - note metadata
//! - [`ShareLink`] - the `id#secret` capability
//!
//! ## Zero knowledge
//!
//! The wire blob alone can't be opened, and the base secret alone points at
//! nothing. A passphrase, when used, is stretched with PBKDF2 salted by the
//! base secret, so guessing it offline also requires the link.

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod link;
pub mod protocol;
pub mod types;

pub use crypto::{
    derive_key, derive_key_from_slice, BaseSecret, EncryptionNonce, SymmetricKey, KEY_LEN,
    NONCE_LEN, PBKDF2_ITERATIONS,
};
pub use envelope::{EncryptionFormat, SealedEnvelope};
pub use error::{CoreError, Result};
pub use link::ShareLink;
pub use protocol::{open, seal, SealedNote, SecretPayload};
pub use types::{ContentKind, NoteId, ViewPolicy, NOTE_ID_LEN};
