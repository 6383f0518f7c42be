//! Cryptographic primitives for Blindnote.
//!
//! Key derivation (PBKDF2-HMAC-SHA256 when a passphrase is present) and
//! ChaCha20-Poly1305 authenticated encryption. Everything here is pure and
//! stateless apart from the system RNG.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

/// Length of a base secret and of every symmetric key.
pub const KEY_LEN: usize = 32;

/// Length of a ChaCha20-Poly1305 nonce.
pub const NONCE_LEN: usize = 12;

/// PBKDF2 work factor for passphrase-protected notes.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// The random half of a note's key material.
///
/// Generated client-side per note and carried to the recipient only in
/// the URL fragment. Zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BaseSecret([u8; KEY_LEN]);

impl BaseSecret {
    /// Generate a new random base secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CoreError::InvalidKeyLength {
            expected: KEY_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encode as unpadded base64url, the form used in share links.
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Decode from unpadded base64url.
    pub fn from_base64url(s: &str) -> Result<Self> {
        let mut bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| CoreError::InvalidLink(format!("bad key encoding: {}", e)))?;
        let secret = Self::from_slice(&bytes);
        bytes.zeroize();
        secret
    }
}

impl fmt::Debug for BaseSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BaseSecret(<redacted>)")
    }
}

/// Derive the symmetric key for a note.
///
/// Without a passphrase the base secret is the key. With one, the
/// passphrase is stretched with PBKDF2 using the base secret as salt, so
/// both halves are needed. An empty passphrase counts as none.
///
/// There is no notion of a "wrong" passphrase here: a different
/// passphrase simply yields a different key.
pub fn derive_key(base: &BaseSecret, passphrase: Option<&str>) -> SymmetricKey {
    match passphrase.filter(|p| !p.is_empty()) {
        None => SymmetricKey(base.0),
        Some(passphrase) => {
            let mut out = [0u8; KEY_LEN];
            pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), &base.0, PBKDF2_ITERATIONS, &mut out);
            SymmetricKey(out)
        }
    }
}

/// [`derive_key`] over an unchecked byte slice.
///
/// Fails only when `base` is not exactly [`KEY_LEN`] bytes.
pub fn derive_key_from_slice(base: &[u8], passphrase: Option<&str>) -> Result<SymmetricKey> {
    let base = BaseSecret::from_slice(base)?;
    Ok(derive_key(&base, passphrase))
}

/// A 256-bit symmetric key for ChaCha20-Poly1305. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encrypt data with this key. The output carries the 16-byte tag.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.0));
        cipher
            .encrypt(Nonce::from_slice(nonce.as_bytes()), plaintext)
            .map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Decrypt data with this key.
    ///
    /// Any tampering or a wrong key fails closed with
    /// [`CoreError::AuthenticationFailure`].
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.0));
        cipher
            .decrypt(Nonce::from_slice(nonce.as_bytes()), ciphertext)
            .map_err(|_| CoreError::AuthenticationFailure)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionNonce([u8; NONCE_LEN]);

impl EncryptionNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::from_bytes([7u8; KEY_LEN]);
        let nonce = EncryptionNonce::generate();
        let plaintext = b"hello, world!";

        let ciphertext = key.encrypt(plaintext, &nonce).unwrap();
        assert_ne!(&ciphertext[..plaintext.len()], plaintext);
        assert_eq!(ciphertext.len(), plaintext.len() + 16);

        let decrypted = key.decrypt(&ciphertext, &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = SymmetricKey::from_bytes([1u8; KEY_LEN]);
        let key2 = SymmetricKey::from_bytes([2u8; KEY_LEN]);
        let nonce = EncryptionNonce::generate();

        let ciphertext = key1.encrypt(b"secret", &nonce).unwrap();

        assert_eq!(
            key2.decrypt(&ciphertext, &nonce),
            Err(CoreError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_decrypt_tampered_fails() {
        let key = SymmetricKey::from_bytes([3u8; KEY_LEN]);
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.encrypt(b"secret", &nonce).unwrap();

        for i in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x01;
            assert!(key.decrypt(&tampered, &nonce).is_err(), "flip at byte {}", i);
        }

        let mut bytes = *nonce.as_bytes();
        bytes[0] ^= 0x80;
        let other_nonce = EncryptionNonce::from_bytes(bytes);
        assert!(key.decrypt(&ciphertext, &other_nonce).is_err());
    }

    #[test]
    fn test_no_passphrase_uses_base_secret() {
        let base = BaseSecret::from_bytes([0x42; KEY_LEN]);
        assert_eq!(derive_key(&base, None).as_bytes(), base.as_bytes());
        assert_eq!(derive_key(&base, Some("")).as_bytes(), base.as_bytes());
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let base = BaseSecret::from_bytes([0x42; KEY_LEN]);

        let key1 = derive_key(&base, Some("correct horse"));
        let key2 = derive_key(&base, Some("correct horse"));

        assert_eq!(key1.as_bytes(), key2.as_bytes());
        assert_ne!(key1.as_bytes(), base.as_bytes());
    }

    #[test]
    fn test_key_derivation_needs_both_halves() {
        let base_a = BaseSecret::from_bytes([0x01; KEY_LEN]);
        let base_b = BaseSecret::from_bytes([0x02; KEY_LEN]);

        let key = derive_key(&base_a, Some("pass"));
        assert_ne!(key.as_bytes(), derive_key(&base_a, Some("Pass")).as_bytes());
        assert_ne!(key.as_bytes(), derive_key(&base_b, Some("pass")).as_bytes());
    }

    #[test]
    fn test_derive_from_slice_checks_length() {
        assert_eq!(
            derive_key_from_slice(&[0u8; 16], None).unwrap_err(),
            CoreError::InvalidKeyLength {
                expected: KEY_LEN,
                got: 16
            }
        );
        assert!(derive_key_from_slice(&[0u8; KEY_LEN], Some("x")).is_ok());
    }

    #[test]
    fn test_base_secret_base64url() {
        let secret = BaseSecret::generate();
        let encoded = secret.to_base64url();

        assert_eq!(encoded.len(), 43);
        assert!(!encoded.contains('=') && !encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(BaseSecret::from_base64url(&encoded).unwrap(), secret);
        assert!(BaseSecret::from_base64url("AAAA").is_err());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let secret = BaseSecret::from_bytes([0xee; KEY_LEN]);
        assert_eq!(format!("{:?}", secret), "BaseSecret(<redacted>)");
        let key = derive_key(&secret, None);
        assert_eq!(format!("{:?}", key), "SymmetricKey(<redacted>)");
    }
}
