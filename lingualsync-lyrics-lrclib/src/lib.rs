use async_trait::async_trait;
use lingualsync_core::{CoreError, FetchedLyrics, LyricsQuery, LyricsResult, LyricsSource};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const LRCLIB_API_URL: &str = "https://lrclib.net/api";

/// Default timeout for HTTP requests (15 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Duration tolerance for matching (±2 seconds)
const DURATION_TOLERANCE_SECS: f64 = 2.0;

/// Calculate a score for duration matching (lower is better).
/// Returns 0 for exact matches, higher values for larger differences.
/// Capped at `i32::MAX` to prevent overflow.
#[allow(clippy::cast_possible_truncation)]
fn duration_score(actual: Option<f64>, expected: Option<u32>, scale: f64) -> i32 {
    match (actual, expected) {
        (Some(d), Some(q)) => {
            let diff = (d - f64::from(q)).abs() * scale;
            if diff > f64::from(i32::MAX) {
                i32::MAX
            } else {
                diff as i32
            }
        }
        _ => 50, // Default score when duration is unknown
    }
}

/// LRCLIB.net lyrics source
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl LrclibProvider {
    /// Create a new LRCLIB provider with a 15-second timeout and 3 retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, CoreError> {
        Self::with_options(Duration::from_secs(DEFAULT_TIMEOUT_SECS), DEFAULT_MAX_RETRIES)
    }

    /// Create a provider with a custom request timeout and retry budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_options(timeout: Duration, max_retries: u32) -> Result<Self, CoreError> {
        let base_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent("LingualSync/0.1 (https://github.com/kvnxiao/lingualsync)")
            .build()?;

        // Transient transport failures are retried here, inside the provider
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: LRCLIB_API_URL.to_string(),
        })
    }

    /// Point the provider at a different LRCLIB-compatible server
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Response from LRCLIB API
/// Note: API returns additional fields (trackName, albumName) that we don't use;
/// serde ignores unknown fields by default.
#[derive(Debug, Deserialize)]
struct LrclibResponse {
    id: i64,
    #[serde(rename = "artistName")]
    artist_name: String,
    duration: Option<f64>,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

#[async_trait]
impl LyricsSource for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        info!(
            "Fetching lyrics from LRCLIB for: {} - {} (duration: {:?}s)",
            query.artist_name, query.track_name, query.duration_secs
        );

        let url = self.exact_match_url(query);
        info!("LRCLIB GET (exact match): {}", url);

        let response = self.client.get(&url).send().await?;
        info!("LRCLIB response status: {}", response.status());

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!("LRCLIB exact match not found, trying search by track name only");
            return self.search_by_track_name(query).await;
        }

        if !response.status().is_success() {
            warn!("LRCLIB returned status: {}", response.status());
            return Err(self.status_error(response.status()));
        }

        let result: LrclibResponse = response.json().await?;
        info!("LRCLIB found match with id: {}", result.id);
        Ok(parse_response(result))
    }
}

impl LrclibProvider {
    fn exact_match_url(&self, query: &LyricsQuery) -> String {
        use std::fmt::Write;

        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(&query.artist_name),
            urlencoding::encode(&query.track_name)
        );

        if let Some(ref album) = query.album_name {
            let _ = write!(url, "&album_name={}", urlencoding::encode(album));
        }

        if let Some(duration) = query.duration_secs {
            let _ = write!(url, "&duration={duration}");
        }

        url
    }

    fn status_error(&self, status: reqwest::StatusCode) -> CoreError {
        CoreError::LyricsProviderFailed {
            provider: self.name().to_string(),
            reason: format!("LRCLIB returned status: {status}"),
        }
    }

    /// Search by track name only and match duration within ±2 seconds
    async fn search_by_track_name(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        let url = format!(
            "{}/search?track_name={}",
            self.base_url,
            urlencoding::encode(&query.track_name)
        );

        info!("LRCLIB GET (search by track): {}", url);

        let response = self.client.get(&url).send().await?;
        info!("LRCLIB response status: {}", response.status());

        if !response.status().is_success() {
            warn!("LRCLIB search returned status: {}", response.status());
            return self.search_fallback(query).await;
        }

        let results: Vec<LrclibResponse> = response.json().await?;
        let filtered = filter_by_duration(results, query.duration_secs);

        match pick_best(filtered, query.duration_secs, 10.0) {
            Some(result) => {
                info!(
                    "LRCLIB found match by track name + duration (id: {}, artist: {}, duration: {:?})",
                    result.id, result.artist_name, result.duration
                );
                Ok(parse_response(result))
            }
            None => {
                info!("LRCLIB search by track name: no usable lyrics, trying full search");
                self.search_fallback(query).await
            }
        }
    }

    async fn search_fallback(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        let search_query = format!("{} {}", query.artist_name, query.track_name);
        let url = format!(
            "{}/search?q={}",
            self.base_url,
            urlencoding::encode(&search_query)
        );

        info!("LRCLIB GET (full search): {}", url);

        let response = self.client.get(&url).send().await?;
        info!("LRCLIB response status: {}", response.status());

        if !response.status().is_success() {
            return Err(self.status_error(response.status()));
        }

        let results: Vec<LrclibResponse> = response.json().await?;

        match pick_best(results, query.duration_secs, 1.0) {
            Some(result) => {
                info!(
                    "LRCLIB found match via full search (id: {}, artist: {})",
                    result.id, result.artist_name
                );
                Ok(parse_response(result))
            }
            None => {
                info!(
                    "LRCLIB has no lyrics for {} - {}",
                    query.artist_name, query.track_name
                );
                Ok(FetchedLyrics::not_found(""))
            }
        }
    }
}

/// Keep results within the duration tolerance when a duration is known
fn filter_by_duration(results: Vec<LrclibResponse>, duration_secs: Option<u32>) -> Vec<LrclibResponse> {
    let Some(query_duration) = duration_secs else {
        return results;
    };
    let query_duration = f64::from(query_duration);
    results
        .into_iter()
        .filter(|r| {
            r.duration
                .is_some_and(|d| (d - query_duration).abs() <= DURATION_TOLERANCE_SECS)
        })
        .collect()
}

/// Prefer synced lyrics, then the closest duration
fn pick_best(
    results: Vec<LrclibResponse>,
    duration_secs: Option<u32>,
    duration_scale: f64,
) -> Option<LrclibResponse> {
    results
        .into_iter()
        .filter(|r| r.synced_lyrics.is_some() || r.plain_lyrics.is_some())
        .min_by_key(|r| {
            let sync_score: i32 = if r.synced_lyrics.is_some() { 0 } else { 100 };
            sync_score.saturating_add(duration_score(r.duration, duration_secs, duration_scale))
        })
}

fn parse_response(result: LrclibResponse) -> FetchedLyrics {
    let provider_id = result.id.to_string();

    if result.instrumental {
        debug!("Track is instrumental (lrclib id: {})", result.id);
        return FetchedLyrics::not_found(provider_id);
    }

    // Prefer synced lyrics
    if let Some(synced) = result.synced_lyrics.filter(|s| !s.trim().is_empty()) {
        debug!("Got synced lyrics (lrclib id: {})", result.id);
        return FetchedLyrics {
            result: LyricsResult::Synced(synced),
            provider_id,
        };
    }

    // Fall back to plain lyrics
    if let Some(plain) = result.plain_lyrics.filter(|s| !s.trim().is_empty()) {
        debug!("Got plain lyrics (lrclib id: {})", result.id);
        return FetchedLyrics {
            result: LyricsResult::Unsynced(plain),
            provider_id,
        };
    }

    FetchedLyrics::not_found(provider_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> LrclibResponse {
        serde_json::from_str(json).unwrap()
    }

    fn entry(id: i64, duration: f64, synced: bool) -> LrclibResponse {
        LrclibResponse {
            id,
            artist_name: "Artist".to_string(),
            duration: Some(duration),
            instrumental: false,
            plain_lyrics: Some("plain".to_string()),
            synced_lyrics: synced.then(|| "[00:01.00]synced".to_string()),
        }
    }

    #[test]
    fn test_parse_synced_response() {
        let fetched = parse_response(response(
            r#"{"id": 42, "trackName": "Song", "artistName": "Artist", "albumName": "Album",
                "duration": 200.0, "instrumental": false,
                "plainLyrics": "Hello", "syncedLyrics": "[00:01.00]Hello"}"#,
        ));
        assert_eq!(fetched.provider_id, "42");
        assert_eq!(
            fetched.result,
            LyricsResult::Synced("[00:01.00]Hello".to_string())
        );
    }

    #[test]
    fn test_parse_plain_only_response() {
        let fetched = parse_response(response(
            r#"{"id": 7, "artistName": "Artist", "duration": 200.0, "instrumental": false,
                "plainLyrics": "Hello", "syncedLyrics": null}"#,
        ));
        assert_eq!(fetched.result, LyricsResult::Unsynced("Hello".to_string()));
    }

    #[test]
    fn test_parse_instrumental_response() {
        let fetched = parse_response(response(
            r#"{"id": 9, "artistName": "Artist", "duration": 200.0, "instrumental": true,
                "plainLyrics": null, "syncedLyrics": null}"#,
        ));
        assert_eq!(fetched.result, LyricsResult::NotFound);
        assert_eq!(fetched.provider_id, "9");
    }

    #[test]
    fn test_blank_synced_falls_back_to_plain() {
        let fetched = parse_response(response(
            r#"{"id": 3, "artistName": "Artist", "duration": null,
                "plainLyrics": "Hello", "syncedLyrics": "  "}"#,
        ));
        assert_eq!(fetched.result, LyricsResult::Unsynced("Hello".to_string()));
    }

    #[test]
    fn test_filter_by_duration() {
        let results = vec![entry(1, 180.0, true), entry(2, 201.5, true), entry(3, 250.0, true)];
        let filtered = filter_by_duration(results, Some(200));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);

        let unfiltered = filter_by_duration(vec![entry(1, 180.0, true)], None);
        assert_eq!(unfiltered.len(), 1);
    }

    #[test]
    fn test_pick_best_prefers_synced_then_duration() {
        let results = vec![entry(1, 200.0, false), entry(2, 203.0, true), entry(3, 201.0, true)];
        assert_eq!(pick_best(results, Some(200), 1.0).unwrap().id, 3);
        assert!(pick_best(Vec::new(), Some(200), 1.0).is_none());
    }

    #[test]
    fn test_duration_score() {
        assert_eq!(duration_score(Some(200.0), Some(200), 1.0), 0);
        assert_eq!(duration_score(Some(203.0), Some(200), 10.0), 30);
        assert_eq!(duration_score(None, Some(200), 1.0), 50);
        assert_eq!(duration_score(Some(1e12), Some(0), 10.0), i32::MAX);
    }

    #[test]
    fn test_exact_match_url() {
        let provider = LrclibProvider::new()
            .unwrap()
            .with_base_url("http://localhost:3000/api/");
        let query = LyricsQuery::new("Song Name", "The Artist")
            .with_album("Album & More")
            .with_duration(200);
        assert_eq!(
            provider.exact_match_url(&query),
            "http://localhost:3000/api/get?artist_name=The%20Artist&track_name=Song%20Name&album_name=Album%20%26%20More&duration=200"
        );
    }
}
