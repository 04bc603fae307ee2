use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a track for lyric caching: the source's track ID plus its
/// duration, which tolerates metadata differences between requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackSignature {
    pub track_id: String,
    pub duration_secs: u32,
}

impl TrackSignature {
    #[must_use]
    pub fn new(track_id: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            track_id: track_id.into(),
            duration_secs,
        }
    }
}

impl fmt::Display for TrackSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}s", self.track_id, self.duration_secs)
    }
}

/// Translation cache key: a track signature paired with a target language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationKey {
    pub signature: TrackSignature,
    pub language: String,
}

impl TranslationKey {
    /// Build a key, normalizing the language code (`" ES "` and `"es"` match)
    #[must_use]
    pub fn new(signature: TrackSignature, language: &str) -> Self {
        Self {
            signature,
            language: normalize_language(language),
        }
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.signature, self.language)
    }
}

/// Trim and ASCII-lowercase a language code
#[must_use]
pub fn normalize_language(language: &str) -> String {
    language.trim().to_ascii_lowercase()
}

/// The track a sync request is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub signature: TrackSignature,
    /// Artist name(s)
    pub artist: String,
    /// Track title
    pub title: String,
    /// Album name, if known
    pub album: Option<String>,
}

impl TrackInfo {
    #[must_use]
    pub fn new(
        signature: TrackSignature,
        artist: impl Into<String>,
        title: impl Into<String>,
        album: Option<String>,
    ) -> Self {
        Self {
            signature,
            artist: artist.into(),
            title: title.into(),
            album,
        }
    }
}
