//! Error types for Blindnote Core.

use thiserror::Error;

/// Errors produced by the client-side protocol primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The envelope could not be opened.
    ///
    /// Wrong base secret, wrong passphrase, and tampered or malformed
    /// ciphertext all collapse into this one variant.
    #[error("authentication failed: wrong key or corrupted data")]
    AuthenticationFailure,

    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid note id: {0}")]
    InvalidNoteId(String),

    #[error("invalid share link: {0}")]
    InvalidLink(String),

    #[error("unknown content kind: {0}")]
    UnknownContentKind(String),

    /// Serialization failed while sealing. Never produced by `open`.
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
