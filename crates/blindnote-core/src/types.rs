//! Strong type definitions for Blindnote.
//!
//! Identifiers and policies are newtypes and enums so a note id can't be
//! confused with a secret, and "unlimited views" is a state rather than a
//! magic number.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Number of random bytes in a note id (128 bits).
pub const NOTE_ID_LEN: usize = 16;

/// An opaque, unguessable note identifier.
///
/// The id is half of the capability needed to read a note, so `Debug`
/// only prints a fingerprint. Use `Display` or [`NoteId::to_hex`] where
/// the full id is actually needed (links, storage keys).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId([u8; NOTE_ID_LEN]);

impl NoteId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NOTE_ID_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NOTE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NOTE_ID_LEN] {
        &self.0
    }

    /// Convert to lowercase hex (32 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidNoteId(e.to_string()))?;
        let arr: [u8; NOTE_ID_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::InvalidNoteId(format!("expected {} bytes, got {}", NOTE_ID_LEN, b.len()))
        })?;
        Ok(Self(arr))
    }

    /// A short, non-reversible tag that is safe to put in logs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new_derive_key("blindnote-v1 note-id fingerprint");
        hasher.update(&self.0);
        hasher.finalize().to_hex()[..12].to_string()
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId(#{})", self.fingerprint())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for NoteId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Describes the payload shape for client rendering.
///
/// The store carries this tag around but never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Username/password style credentials.
    #[default]
    Password,
    /// A single API key or token.
    ApiKey,
    /// Free-form labelled fields.
    Custom,
}

impl ContentKind {
    /// The tag used in storage and on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Password => "password",
            ContentKind::ApiKey => "apikey",
            ContentKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "password" => Ok(ContentKind::Password),
            "apikey" => Ok(ContentKind::ApiKey),
            "custom" => Ok(ContentKind::Custom),
            other => Err(CoreError::UnknownContentKind(other.to_string())),
        }
    }
}

/// How many successful retrievals a note allows before it is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPolicy {
    /// Destroyed by the first successful retrieval.
    #[default]
    OneTime,
    /// Destroyed by the n-th successful retrieval.
    Limited(NonZeroU32),
    /// Readable any number of times until it expires.
    Unlimited,
}

impl ViewPolicy {
    /// Map the `oneTime` creation flag onto a policy.
    pub const fn from_one_time(one_time: bool) -> Self {
        if one_time {
            ViewPolicy::OneTime
        } else {
            ViewPolicy::Unlimited
        }
    }

    /// The maximum number of views, or `None` when unbounded.
    pub const fn view_limit(&self) -> Option<u32> {
        match self {
            ViewPolicy::OneTime => Some(1),
            ViewPolicy::Limited(n) => Some(n.get()),
            ViewPolicy::Unlimited => None,
        }
    }

    /// Rebuild a policy from a stored view limit.
    ///
    /// Returns `None` for a limit of zero, which no valid note can have.
    pub fn from_view_limit(limit: Option<u32>) -> Option<Self> {
        match limit {
            None => Some(ViewPolicy::Unlimited),
            Some(1) => Some(ViewPolicy::OneTime),
            Some(n) => NonZeroU32::new(n).map(ViewPolicy::Limited),
        }
    }

    /// Whether a note that has already served `consumed` views may serve another.
    pub fn allows_view(&self, consumed: u32) -> bool {
        match self.view_limit() {
            Some(limit) => consumed < limit,
            None => true,
        }
    }

    /// Whether serving a view after `consumed` previous views uses up the note.
    pub fn is_last_view(&self, consumed: u32) -> bool {
        match self.view_limit() {
            Some(limit) => consumed.saturating_add(1) >= limit,
            None => false,
        }
    }
}
