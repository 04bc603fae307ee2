pub mod cache;
pub mod config;
pub mod error;
pub mod lrc;
pub mod orchestrator;
pub mod paths;
pub mod provider;
pub mod sync;
pub mod time;
pub mod track;

pub use cache::{CacheEntry, LyricsCache, TranslationCache, TtlCache};
pub use config::{
    DisplayConfig, LingualSyncConfig, LoggingConfig, LyricsConfig, TranslationConfig,
    CONFIG_TEMPLATE,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::CoreError;
pub use lrc::LyricLine;
pub use orchestrator::{SyncOrchestrator, SyncResult, WindowConfig};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use provider::{FetchedLyrics, LyricsQuery, LyricsResult, LyricsSource, TranslationService};
pub use time::{Clock, DurationExt, ManualClock, SystemClock};
pub use track::{TrackInfo, TrackSignature, TranslationKey};
