//! Sealed envelope wire format.
//!
//! The server stores exactly these bytes as a note's ciphertext. The
//! envelope names the algorithm and carries the nonce; it is meaningless
//! without the key.

use serde::{Deserialize, Serialize};

use crate::crypto::{EncryptionNonce, SymmetricKey};
use crate::error::{CoreError, Result};

/// Format identifier for sealed envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EncryptionFormat {
    /// ChaCha20-Poly1305 with 256-bit key and 96-bit random nonce.
    ChaCha20Poly1305 = 1,
}

/// An authenticated-encryption envelope: nonce plus ciphertext and tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// Encryption algorithm used.
    pub format: EncryptionFormat,

    /// Nonce used for encryption (fresh per seal).
    pub nonce: EncryptionNonce,

    /// The encrypted data (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl SealedEnvelope {
    /// Encrypt plaintext under a fresh random nonce.
    pub fn seal(plaintext: &[u8], key: &SymmetricKey) -> Result<Self> {
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;

        Ok(Self {
            format: EncryptionFormat::ChaCha20Poly1305,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt with the given key.
    pub fn open(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        match self.format {
            EncryptionFormat::ChaCha20Poly1305 => key.decrypt(&self.ciphertext, &self.nonce),
        }
    }

    /// Serialize to CBOR bytes (the wire blob).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    ///
    /// A blob that doesn't parse is reported as an authentication failure,
    /// same as one that parses but fails to decrypt.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|_| CoreError::AuthenticationFailure)
    }

    /// Get the size of the ciphertext.
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }
}
