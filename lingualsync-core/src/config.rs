use crate::error::{CoreError, Result};
use crate::orchestrator::WindowConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LingualSyncConfig {
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsConfig {
    #[serde(default = "default_lyrics_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_lyrics_cache_ttl() -> u64 {
    60 * 60
}

const fn default_request_timeout() -> u64 {
    15
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_lyrics_cache_ttl(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl LyricsConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Google Cloud Translation API key; falls back to the environment
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_translation_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_language() -> String {
    "en".to_string()
}

const fn default_translation_cache_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_language: default_language(),
            cache_ttl_secs: default_translation_cache_ttl(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl TranslationConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_lines_before")]
    pub lines_before: usize,
    #[serde(default = "default_lines_after")]
    pub lines_after: usize,
}

const fn default_lines_before() -> usize {
    2
}

const fn default_lines_after() -> usize {
    6
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            lines_before: default_lines_before(),
            lines_after: default_lines_after(),
        }
    }
}

impl From<&DisplayConfig> for WindowConfig {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            before: display.lines_before,
            after: display.lines_after,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the cache directory
    #[serde(default)]
    pub enabled: bool,
}

impl LingualSyncConfig {
    /// Get the configuration directory path (~/.config/lingualsync/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/lingualsync/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location, creating a template on first run
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed, or fails validation.
    /// Returns `ConfigNotFound` after writing the template on first run.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `config_path`, creating a template there if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed, or fails validation.
    /// Returns `ConfigNotFound` after writing the template on first run.
    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: config_path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(config_path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.lyrics.cache_ttl_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "lyrics.cache_ttl_secs must be greater than 0".to_string(),
            });
        }
        if self.translation.cache_ttl_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "translation.cache_ttl_secs must be greater than 0".to_string(),
            });
        }
        if self.translation.default_language.trim().is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "translation.default_language".to_string(),
            });
        }
        Ok(())
    }

    /// Display window as used by the orchestrator
    #[must_use]
    pub fn window(&self) -> WindowConfig {
        WindowConfig::from(&self.display)
    }
}

/// Commented template written on first run
pub const CONFIG_TEMPLATE: &str = r#"# LingualSync Configuration
# ~/.config/lingualsync/config.toml

[lyrics]
# How long fetched lyrics (including "no lyrics found") stay cached
cache_ttl_secs = 3600
request_timeout_secs = 15
# Retries for transient network failures inside the lyrics provider
max_retries = 3

[translation]
# Google Cloud Translation API key. Leave empty to use GOOGLE_TRANSLATE_API_KEY.
api_key = ""
default_language = "en"
cache_ttl_secs = 86400
request_timeout_secs = 15

[display]
# Lines shown before and after the active line
lines_before = 2
lines_after = 6

[logging]
# Also write logs to a file in the cache directory
enabled = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let config = LingualSyncConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, LingualSyncConfig::default());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LingualSyncConfig::from_toml_str("").unwrap();
        assert_eq!(config.lyrics.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.translation.cache_ttl(), Duration::from_secs(86400));
        assert_eq!(config.lyrics.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.window(), WindowConfig::default());
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_partial_override() {
        let config = LingualSyncConfig::from_toml_str(
            r#"
[translation]
api_key = "secret"
default_language = "ja"

[display]
lines_after = 3
"#,
        )
        .unwrap();
        assert_eq!(config.translation.api_key, "secret");
        assert_eq!(config.translation.default_language, "ja");
        assert_eq!(config.window(), WindowConfig { before: 2, after: 3 });
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let err = LingualSyncConfig::from_toml_str("[lyrics]\ncache_ttl_secs = 0\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = LingualSyncConfig::from_toml_str("[lyrics\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParseError(_)));
    }

    #[test]
    fn test_load_or_create_writes_template() {
        let dir = std::env::temp_dir().join(format!("lingualsync-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_file(&path);

        let err = LingualSyncConfig::load_or_create_at(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound { .. }));
        assert!(path.exists());

        let config = LingualSyncConfig::load_or_create_at(&path).unwrap();
        assert_eq!(config, LingualSyncConfig::default());

        let _ = fs::remove_dir_all(&dir);
    }
}
