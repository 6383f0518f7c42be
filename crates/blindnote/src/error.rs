//! Error types for the note service.

use blindnote_core::CoreError;
use blindnote_store::StoreError;
use thiserror::Error;

/// The one message shown for a note that is gone *or* can't be decrypted.
pub const GONE_OR_WRONG_KEY: &str = "This secret is gone or the key is wrong.";

/// Rejections at the service boundary, before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ciphertext is empty")]
    EmptyCiphertext,

    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("ttl of {minutes} minutes is outside {min}..={max}")]
    TtlOutOfRange { minutes: u32, min: u32, max: u32 },

    #[error("view limit must be at least 1")]
    ZeroViewLimit,

    #[error("malformed note id")]
    MalformedId,
}

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before reaching storage.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Missing, expired, or already consumed. Deliberately not more specific.
    #[error("note not found")]
    NotFound,

    /// Storage unavailable or timed out.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Configuration rejected at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ServiceError {
    /// Whether retrying with backoff may help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Storage(_))
    }

    /// Text safe to show an end user.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServiceError::NotFound => GONE_OR_WRONG_KEY,
            ServiceError::Validation(_) => "The request was invalid.",
            ServiceError::Storage(_) => "The service is temporarily unavailable. Please retry.",
            ServiceError::InvalidConfig(_) => "The service is misconfigured.",
        }
    }
}

/// User-facing text for a failed client-side open.
///
/// Authentication failures read exactly like [`ServiceError::NotFound`],
/// so a recipient can't tell a wrong key from a vanished note.
pub fn open_failure_message(err: &CoreError) -> &'static str {
    match err {
        CoreError::AuthenticationFailure => GONE_OR_WRONG_KEY,
        CoreError::InvalidKeyLength { .. } | CoreError::InvalidLink(_) => {
            "This link is incomplete or malformed."
        }
        _ => "This secret could not be opened.",
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
