use crate::error::CoreError;
use crate::track::TrackInfo;
use async_trait::async_trait;

/// Query parameters for fetching lyrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Track name
    pub track_name: String,
    /// Artist name
    pub artist_name: String,
    /// Album name (optional)
    pub album_name: Option<String>,
    /// Track duration in seconds (for matching)
    pub duration_secs: Option<u32>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            album_name: None,
            duration_secs: None,
        }
    }

    /// Set album name
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album_name = Some(album.into());
        self
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

impl From<&TrackInfo> for LyricsQuery {
    fn from(track: &TrackInfo) -> Self {
        let query = Self::new(&track.title, &track.artist)
            .with_duration(track.signature.duration_secs);
        match track.album.as_deref() {
            Some(album) if !album.trim().is_empty() => query.with_album(album),
            _ => query,
        }
    }
}

/// Result from a lyrics provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsResult {
    /// Raw LRC text with timestamps
    Synced(String),
    /// Plain text lyrics without timing
    Unsynced(String),
    /// No lyrics found
    NotFound,
}

/// Lyrics with provider metadata
#[derive(Debug, Clone)]
pub struct FetchedLyrics {
    /// The lyrics result
    pub result: LyricsResult,
    /// Provider-specific ID (e.g., LRCLIB's numeric ID as string)
    pub provider_id: String,
}

impl FetchedLyrics {
    #[must_use]
    pub fn not_found(provider_id: impl Into<String>) -> Self {
        Self {
            result: LyricsResult::NotFound,
            provider_id: provider_id.into(),
        }
    }
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsSource: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch lyrics for a query.
    ///
    /// "Not found" is a successful [`LyricsResult::NotFound`]; errors mean the
    /// provider could not be asked.
    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError>;
}

/// Trait for services translating lyric lines one-to-one
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Get the service name
    fn name(&self) -> &'static str;

    /// Translate each line into `target_language`, preserving order.
    ///
    /// A well-behaved service returns exactly one output per input line.
    async fn translate(
        &self,
        lines: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackSignature;

    #[test]
    fn test_query_from_track() {
        let track = TrackInfo::new(
            TrackSignature::new("abc", 215),
            "Artist",
            "Song",
            Some("Album".to_string()),
        );
        let query = LyricsQuery::from(&track);
        assert_eq!(query.track_name, "Song");
        assert_eq!(query.artist_name, "Artist");
        assert_eq!(query.album_name.as_deref(), Some("Album"));
        assert_eq!(query.duration_secs, Some(215));
    }

    #[test]
    fn test_query_skips_blank_album() {
        let track = TrackInfo::new(
            TrackSignature::new("abc", 215),
            "Artist",
            "Song",
            Some("  ".to_string()),
        );
        assert_eq!(LyricsQuery::from(&track).album_name, None);
    }
}
