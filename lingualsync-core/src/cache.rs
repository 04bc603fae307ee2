use crate::lrc::LyricLine;
use crate::time::{Clock, DurationExt, SystemClock};
use crate::track::{TrackSignature, TranslationKey};
use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default lifetime of cached lyric lines (1 hour)
pub const DEFAULT_LYRICS_TTL: Duration = Duration::from_secs(60 * 60);

/// Default lifetime of cached translations (24 hours)
pub const DEFAULT_TRANSLATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Parsed lyric lines keyed by track signature. An empty list is a valid
/// entry meaning "no synced lyrics for this track".
pub type LyricsCache = TtlCache<TrackSignature, Arc<[LyricLine]>>;

/// Translated line texts keyed by track signature and language
pub type TranslationCache = TtlCache<TranslationKey, Arc<[String]>>;

/// A cached value and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub fetched_at: i64,
}

impl<V> CacheEntry<V> {
    /// Fresh while `now - fetched_at < ttl`
    #[must_use]
    pub const fn is_fresh(&self, now: i64, ttl_secs: i64) -> bool {
        now.saturating_sub(self.fetched_at) < ttl_secs
    }
}

/// In-memory key-value store whose entries expire after a fixed TTL.
///
/// Expired entries read as absent and are evicted lazily by [`TtlCache::get`]
/// or in bulk by [`TtlCache::purge_expired`]. Each key is replaced atomically;
/// concurrent writers to the same key race last-writer-wins.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + fmt::Display,
    V: Clone,
{
    /// Create a cache backed by the wall clock
    #[must_use]
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_clock(name, ttl, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Get a value if it was stored less than one TTL ago
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now_epoch_secs();
        let ttl_secs = self.ttl.as_secs_i64();

        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(now, ttl_secs) {
                debug!("{} cache HIT for {}", self.name, key);
                return Some(entry.value.clone());
            }
            // Drop the read guard before removing
            drop(entry);
            // A concurrent put may have refreshed the entry in the meantime
            self.entries
                .remove_if(key, |_, entry| !entry.is_fresh(now, ttl_secs));
            debug!("{} cache EXPIRED for {}", self.name, key);
            return None;
        }

        debug!("{} cache MISS for {}", self.name, key);
        None
    }

    /// Store a value, replacing any previous entry for the key
    pub fn put(&self, key: K, value: V) {
        debug!("{} cache STORE for {}", self.name, key);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: self.clock.now_epoch_secs(),
            },
        );
    }

    /// Remove an entry regardless of age if its value matches `predicate`
    pub fn remove_if(&self, key: &K, predicate: impl FnOnce(&V) -> bool) {
        if self
            .entries
            .remove_if(key, |_, entry| predicate(&entry.value))
            .is_some()
        {
            debug!("{} cache REMOVE for {}", self.name, key);
        }
    }

    /// Evict every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_epoch_secs();
        let ttl_secs = self.ttl.as_secs_i64();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl_secs));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("{} cache purged {} expired entries", self.name, removed);
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet evicted
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl LyricsCache {
    /// Lyrics cache with the default one-hour TTL
    #[must_use]
    pub fn lyrics() -> Self {
        Self::new("lyrics", DEFAULT_LYRICS_TTL)
    }
}

impl TranslationCache {
    /// Translation cache with the default 24-hour TTL
    #[must_use]
    pub fn translations() -> Self {
        Self::new("translation", DEFAULT_TRANSLATION_TTL)
    }
}

impl<K: Eq + Hash, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
