//! Share links.
//!
//! A note is shared as `{origin}/view/{note_id}#{base_secret}`. Browsers and
//! HTTP infrastructure never transmit the fragment, so the server only
//! ever sees the id half of the capability.

use std::fmt;

use crate::crypto::BaseSecret;
use crate::error::{CoreError, Result};
use crate::types::NoteId;

/// Path segment that precedes the note id.
pub const VIEW_PATH: &str = "/view/";

/// The capability pair handed to a recipient.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub note_id: NoteId,
    pub base_secret: BaseSecret,
}

impl ShareLink {
    pub fn new(note_id: NoteId, base_secret: BaseSecret) -> Self {
        Self {
            note_id,
            base_secret,
        }
    }

    /// Render the full link under `origin` (e.g. `https://notes.example`).
    pub fn to_url(&self, origin: &str) -> String {
        format!(
            "{}{}#{}",
            origin.trim_end_matches('/'),
            self.request_path(),
            self.base_secret.to_base64url()
        )
    }

    /// The part of the link a browser actually requests.
    pub fn request_path(&self) -> String {
        format!("{}{}", VIEW_PATH, self.note_id)
    }

    /// Parse a full link. The key must be in the fragment.
    pub fn parse(url: &str) -> Result<Self> {
        let (location, fragment) = url
            .split_once('#')
            .ok_or_else(|| CoreError::InvalidLink("missing encryption key".into()))?;
        if fragment.is_empty() {
            return Err(CoreError::InvalidLink("missing encryption key".into()));
        }

        let location = location.split_once('?').map_or(location, |(path, _)| path);
        let (_, id) = location
            .rsplit_once(VIEW_PATH)
            .ok_or_else(|| CoreError::InvalidLink("not a note link".into()))?;
        let note_id = NoteId::from_hex(id.trim_end_matches('/'))
            .map_err(|e| CoreError::InvalidLink(e.to_string()))?;

        Ok(Self {
            note_id,
            base_secret: BaseSecret::from_base64url(fragment)?,
        })
    }
}

impl fmt::Debug for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareLink")
            .field("note_id", &self.note_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_roundtrip() {
        let link = ShareLink::new(NoteId::generate(), BaseSecret::generate());
        let url = link.to_url("https://notes.example/");

        assert!(url.starts_with("https://notes.example/view/"));
        assert_eq!(ShareLink::parse(&url).unwrap(), link);
    }

    #[test]
    fn test_secret_only_in_fragment() {
        let link = ShareLink::new(NoteId::generate(), BaseSecret::generate());
        let url = link.to_url("https://notes.example");
        let secret = link.base_secret.to_base64url();

        let (before, after) = url.split_once('#').unwrap();
        assert!(!before.contains(&secret));
        assert_eq!(after, secret);
        assert!(!link.request_path().contains(&secret));
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        let id = NoteId::generate();
        for url in [
            format!("https://notes.example/view/{}", id),
            format!("https://notes.example/view/{}#", id),
        ] {
            assert!(matches!(ShareLink::parse(&url), Err(CoreError::InvalidLink(_))));
        }
    }

    #[test]
    fn test_parse_rejects_foreign_paths() {
        let secret = BaseSecret::generate().to_base64url();
        let url = format!("https://notes.example/about#{}", secret);
        assert!(ShareLink::parse(&url).is_err());

        let url = format!("https://notes.example/view/xyz#{}", secret);
        assert!(ShareLink::parse(&url).is_err());
    }

    #[test]
    fn test_debug_omits_secret() {
        let link = ShareLink::new(NoteId::generate(), BaseSecret::generate());
        let debug = format!("{:?}", link);
        assert!(!debug.contains(&link.base_secret.to_base64url()));
        assert!(!debug.contains(&link.note_id.to_hex()));
    }
}
