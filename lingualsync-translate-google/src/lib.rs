use async_trait::async_trait;
use lingualsync_core::{CoreError, TranslationConfig, TranslationService};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const GOOGLE_TRANSLATE_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Environment variable consulted when the config has no API key
pub const API_KEY_ENV_VAR: &str = "GOOGLE_TRANSLATE_API_KEY";

/// Default timeout for HTTP requests (15 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Google Cloud Translation (v2 REST) service
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleTranslator {
    /// Create a translator with the default 15-second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a translator with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GOOGLE_TRANSLATE_API_URL.to_string(),
        })
    }

    /// Build from config, falling back to `GOOGLE_TRANSLATE_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissingField` if neither source provides a key, or an
    /// error if the HTTP client cannot be created.
    pub fn from_config(config: &TranslationConfig) -> Result<Self, CoreError> {
        let api_key = resolve_api_key(&config.api_key, std::env::var(API_KEY_ENV_VAR).ok())?;
        Self::with_timeout(api_key, config.request_timeout())
    }

    /// Point the translator at a different endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn failure(&self, reason: impl Into<String>) -> CoreError {
        CoreError::TranslationFailed {
            provider: self.name().to_string(),
            reason: reason.into(),
        }
    }
}

/// Config key wins; otherwise the environment value, if non-empty
fn resolve_api_key(configured: &str, from_env: Option<String>) -> Result<String, CoreError> {
    if !configured.trim().is_empty() {
        return Ok(configured.trim().to_string());
    }
    from_env
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| CoreError::ConfigMissingField {
            field: "translation.api_key".to_string(),
        })
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

#[async_trait]
impl TranslationService for GoogleTranslator {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(
        &self,
        lines: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, CoreError> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            "Translating {} lines to {} with Google Translate",
            lines.len(),
            target_language
        );

        let url = format!("{}?key={}", self.base_url, urlencoding::encode(&self.api_key));
        let body = TranslateRequest {
            q: lines,
            target: target_language,
            // Plain text keeps apostrophes and ampersands unescaped
            format: "text",
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        debug!("Google Translate response status: {}", status);

        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            warn!("Google Translate returned status {}: {}", status, details);
            return Err(self.failure(format!("Google Translate returned status: {status}")));
        }

        let text = response.text().await?;
        parse_translations(&text)
            .map_err(|e| self.failure(format!("Unexpected response body: {e}")))
    }
}

/// Extract translated texts in request order
fn parse_translations(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let response: TranslateResponse = serde_json::from_str(body)?;
    if let Some(source) = response
        .data
        .translations
        .first()
        .and_then(|t| t.detected_source_language.as_deref())
    {
        debug!("Detected source language: {}", source);
    }
    Ok(response
        .data
        .translations
        .into_iter()
        .map(|t| t.translated_text)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translations() {
        let body = r#"{
            "data": {
                "translations": [
                    {"translatedText": "Hola", "detectedSourceLanguage": "en"},
                    {"translatedText": "Mundo", "detectedSourceLanguage": "en"}
                ]
            }
        }"#;
        assert_eq!(parse_translations(body).unwrap(), vec!["Hola", "Mundo"]);
    }

    #[test]
    fn test_parse_translations_rejects_garbage() {
        assert!(parse_translations(r#"{"error": {"code": 403}}"#).is_err());
        assert!(parse_translations("not json").is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let lines = vec!["Hello".to_string(), "World".to_string()];
        let body = TranslateRequest {
            q: &lines,
            target: "es",
            format: "text",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["q"][1], "World");
        assert_eq!(json["target"], "es");
        assert_eq!(json["format"], "text");
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(resolve_api_key(" cfg ", Some("env".into())).unwrap(), "cfg");
        assert_eq!(resolve_api_key("", Some("env".into())).unwrap(), "env");
        assert!(matches!(
            resolve_api_key("", Some("  ".into())),
            Err(CoreError::ConfigMissingField { .. })
        ));
        assert!(resolve_api_key("", None).is_err());
    }

    #[tokio::test]
    async fn test_empty_input_skips_network() {
        // Unroutable base URL: any request would fail
        let translator = GoogleTranslator::new("key")
            .unwrap()
            .with_base_url("http://127.0.0.1:9/unreachable");
        let result = translator.translate(&[], "es").await.unwrap();
        assert!(result.is_empty());
    }
}
