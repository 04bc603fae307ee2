//! Resolves the synced, translated lyric view for a track at a playback position.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{LyricsCache, TranslationCache};
use crate::error::Result;
use crate::lrc::{self, LyricLine};
use crate::provider::{LyricsQuery, LyricsResult, LyricsSource, TranslationService};
use crate::sync;
use crate::track::{TrackInfo, TranslationKey};
use serde::Serialize;

/// How many lines to show around the active one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub before: usize,
    pub after: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            before: 2,
            after: 6,
        }
    }
}

/// Per-request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Whether timed lyrics exist for the track
    pub is_synced: bool,
    /// Index of the active line, `-1` when none is active yet
    pub active_index: i64,
    /// Index of the first line in `window`
    pub window_start_index: usize,
    pub active_line: Option<LyricLine>,
    pub window: Vec<LyricLine>,
}

impl SyncResult {
    /// Result for a track without synced lyrics
    #[must_use]
    pub const fn not_synced() -> Self {
        Self {
            is_synced: false,
            active_index: -1,
            window_start_index: 0,
            active_line: None,
            window: Vec::new(),
        }
    }
}

/// Combines the lyric source, the translation service and both caches.
///
/// Construct once and share; the caches are the only mutable state and are
/// safe to use from concurrent requests.
pub struct SyncOrchestrator {
    lyrics_source: Arc<dyn LyricsSource>,
    translator: Arc<dyn TranslationService>,
    lyrics_cache: Arc<LyricsCache>,
    translation_cache: Arc<TranslationCache>,
    window: WindowConfig,
}

impl SyncOrchestrator {
    /// Create an orchestrator with the default display window
    ///
    /// # Arguments
    /// * `lyrics_source` - Where raw lyrics come from on a cache miss
    /// * `translator` - Translates original line texts on a cache miss
    /// * `lyrics_cache` - Parsed lines keyed by track signature
    /// * `translation_cache` - Translated texts keyed by signature and language
    pub fn new(
        lyrics_source: Arc<dyn LyricsSource>,
        translator: Arc<dyn TranslationService>,
        lyrics_cache: Arc<LyricsCache>,
        translation_cache: Arc<TranslationCache>,
    ) -> Self {
        Self {
            lyrics_source,
            translator,
            lyrics_cache,
            translation_cache,
            window: WindowConfig::default(),
        }
    }

    /// Override the display window
    #[must_use]
    pub const fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub const fn window(&self) -> WindowConfig {
        self.window
    }

    /// Resolve the lyric view for `track` at `progress_ms`, translated into
    /// `language`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error if the lyric source or translation
    /// service fails. Nothing is cached for the failed call.
    pub async fn resolve(
        &self,
        track: &TrackInfo,
        language: &str,
        progress_ms: Option<u64>,
    ) -> Result<SyncResult> {
        let lines = self.lyric_lines(track).await?;
        if lines.is_empty() {
            debug!("No synced lyrics for {}", track.signature);
            return Ok(SyncResult::not_synced());
        }

        let key = TranslationKey::new(track.signature.clone(), language);
        let translated = self.translations(&key, &lines).await?;

        // Positional merge into a per-request copy; lines past a short
        // translation stay untranslated
        let merged: Vec<LyricLine> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| line.with_translation(translated.get(i).cloned()))
            .collect();

        let times: Vec<u64> = merged.iter().map(LyricLine::time_ms).collect();
        let active = sync::active_index(&times, progress_ms);

        Ok(SyncResult {
            is_synced: true,
            active_index: sync::index_to_wire(active),
            window_start_index: sync::window_start(active, self.window.before),
            active_line: active.and_then(|i| merged.get(i).cloned()),
            window: sync::window(&merged, active, self.window.before, self.window.after),
        })
    }

    /// Parsed lines for the track, from cache or the lyric source
    async fn lyric_lines(&self, track: &TrackInfo) -> Result<Arc<[LyricLine]>> {
        if let Some(lines) = self.lyrics_cache.get(&track.signature) {
            return Ok(lines);
        }

        info!(
            "Fetching lyrics for: {} - {} ({}, provider: {})",
            track.artist,
            track.title,
            track.signature,
            self.lyrics_source.name()
        );

        let fetched = self
            .lyrics_source
            .fetch(&LyricsQuery::from(track))
            .await
            .inspect_err(|e| {
                warn!("Provider {} failed with error: {}", self.lyrics_source.name(), e);
            })?;

        let lines: Vec<LyricLine> = match &fetched.result {
            LyricsResult::Synced(text) => lrc::parse(text),
            LyricsResult::Unsynced(_) => {
                info!(
                    "Provider {} returned unsynced lyrics (not usable for sync)",
                    self.lyrics_source.name()
                );
                Vec::new()
            }
            LyricsResult::NotFound => {
                info!("Provider {} returned no lyrics", self.lyrics_source.name());
                Vec::new()
            }
        };

        info!(
            "Caching {} synced lines for {} (provider_id: {})",
            lines.len(),
            track.signature,
            fetched.provider_id
        );

        let lines: Arc<[LyricLine]> = lines.into();
        self.lyrics_cache
            .put(track.signature.clone(), Arc::clone(&lines));
        Ok(lines)
    }

    /// Translations aligned with `lines`.
    ///
    /// A cached entry made for a different number of lines is discarded and
    /// re-fetched once. A fresh fetch that comes back the wrong length is
    /// retried once. Only a result whose length matches is cached; otherwise
    /// the last result is used for this request alone.
    async fn translations(
        &self,
        key: &TranslationKey,
        lines: &[LyricLine],
    ) -> Result<Arc<[String]>> {
        let mut attempts = 2;
        if let Some(cached) = self.translation_cache.get(key) {
            if cached.len() == lines.len() {
                return Ok(cached);
            }
            warn!(
                "Cached translation for {} has {} lines but lyrics have {}, re-translating",
                key,
                cached.len(),
                lines.len()
            );
            // Leave a concurrently refreshed entry alone
            self.translation_cache
                .remove_if(key, |entry| entry.len() != lines.len());
            // The stale entry already used up the retry
            attempts = 1;
        }

        let originals: Vec<String> = lines.iter().map(|l| l.original().to_string()).collect();
        let mut translated = Vec::new();

        for attempt in 1..=attempts {
            info!(
                "Translating {} lines for {} (service: {}, attempt {}/{})",
                lines.len(),
                key,
                self.translator.name(),
                attempt,
                attempts
            );

            translated = self
                .translator
                .translate(&originals, &key.language)
                .await
                .inspect_err(|e| {
                    warn!("Translation service {} failed: {}", self.translator.name(), e);
                })?;

            if translated.len() == lines.len() {
                let translated: Arc<[String]> = translated.into();
                self.translation_cache
                    .put(key.clone(), Arc::clone(&translated));
                return Ok(translated);
            }

            warn!(
                "Translation service {} returned {} lines for {} originals",
                self.translator.name(),
                translated.len(),
                lines.len()
            );
        }

        warn!("Using mismatched translation for {} without caching it", key);
        Ok(translated.into())
    }
}
