//! Note sealing protocol.
//!
//! Composes key derivation and the envelope cipher into the two client-side
//! operations: [`seal`] a structured secret into a server-storable wire
//! blob plus a base secret, and [`open`] it again on the recipient's side.
//!
//! ```
//! use blindnote_core::{open, seal, SecretPayload};
//!
//! let payload = SecretPayload::new("prod key").with_field("API Key", "sk-test-123");
//! let sealed = seal(&payload, None).unwrap();
//!
//! let opened = open(&sealed.wire_blob, &sealed.base_secret, None).unwrap();
//! assert_eq!(opened, payload);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::crypto::{derive_key, BaseSecret};
use crate::envelope::SealedEnvelope;
use crate::error::{CoreError, Result};

/// The structured plaintext of a note.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPayload {
    /// Named credential fields. Sorted, so the encoding is canonical.
    pub fields: BTreeMap<String, String>,
    /// Free-text notes.
    pub notes: String,
    /// When the sender created the payload (Unix ms).
    pub created_at: i64,
}

impl SecretPayload {
    /// Start a payload with the given notes, stamped with the current time.
    pub fn new(notes: impl Into<String>) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        Self {
            fields: BTreeMap::new(),
            notes: notes.into(),
            created_at,
        }
    }

    /// Add a named field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Override the creation timestamp.
    pub fn created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Canonical CBOR encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|_| CoreError::AuthenticationFailure)
    }
}

// Field values are secrets; only names are printed.
impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("notes_len", &self.notes.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Output of [`seal`].
#[derive(Debug)]
pub struct SealedNote {
    /// Client-held half of the key material. Never sent to the server.
    pub base_secret: BaseSecret,
    /// Bytes to upload as the note's ciphertext.
    pub wire_blob: Vec<u8>,
    /// Whether a passphrase went into the key.
    pub requires_passphrase: bool,
}

/// Seal a payload under a fresh base secret and optional passphrase.
pub fn seal(payload: &SecretPayload, passphrase: Option<&str>) -> Result<SealedNote> {
    let base_secret = BaseSecret::generate();
    let key = derive_key(&base_secret, passphrase);

    let plaintext = payload.to_bytes()?;
    let envelope = SealedEnvelope::seal(&plaintext, &key)?;

    Ok(SealedNote {
        base_secret,
        wire_blob: envelope.to_bytes()?,
        requires_passphrase: passphrase.is_some_and(|p| !p.is_empty()),
    })
}

/// Open a wire blob with the recipient's key material.
///
/// Every failure, whether a wrong key, a wrong passphrase, or corrupted
/// bytes, is [`CoreError::AuthenticationFailure`].
pub fn open(
    wire_blob: &[u8],
    base_secret: &BaseSecret,
    passphrase: Option<&str>,
) -> Result<SecretPayload> {
    let envelope = SealedEnvelope::from_bytes(wire_blob)?;
    let key = derive_key(base_secret, passphrase);
    let plaintext = envelope.open(&key)?;
    SecretPayload::from_bytes(&plaintext)
}
