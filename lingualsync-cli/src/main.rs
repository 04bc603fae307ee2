use clap::Parser;
use lingualsync_core::{
    CoreError, DurationExt, LingualSyncConfig, LyricsCache, LyricsSource, SyncOrchestrator,
    TrackInfo, TrackSignature, TranslationCache, TranslationService,
};
use lingualsync_lyrics_lrclib::LrclibProvider;
use lingualsync_translate_google::GoogleTranslator;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Print the synced, translated lyric view for a track at a playback position
#[derive(Debug, Parser)]
#[command(name = "lingualsync", version, about)]
struct Args {
    /// Source track ID (e.g. a Spotify track ID)
    #[arg(long)]
    track_id: String,

    /// Track duration in seconds
    #[arg(long)]
    duration: u32,

    #[arg(long)]
    artist: String,

    #[arg(long)]
    title: String,

    #[arg(long)]
    album: Option<String>,

    /// Target language code; defaults to translation.default_language
    #[arg(long)]
    lang: Option<String>,

    /// Playback position in milliseconds
    #[arg(long)]
    progress_ms: Option<u64>,

    /// Keep resolving once a second while advancing the position, until Ctrl+C
    #[arg(long)]
    follow: bool,

    /// Config file to use instead of ~/.config/lingualsync/config.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => LingualSyncConfig::load_or_create_at(path),
        None => LingualSyncConfig::load_or_create(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            eprintln!(
                "Created a config template at {}. Add your translation API key and run again.",
                path.display()
            );
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.logging.enabled);

    match run(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_upstream() => {
            error!("Upstream service unavailable: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: &LingualSyncConfig) -> Result<(), CoreError> {
    let lyrics_source: Arc<dyn LyricsSource> = Arc::new(LrclibProvider::with_options(
        config.lyrics.request_timeout(),
        config.lyrics.max_retries,
    )?);
    let translator: Arc<dyn TranslationService> =
        Arc::new(GoogleTranslator::from_config(&config.translation)?);

    // Process-wide caches, shared by every request the orchestrator serves
    let lyrics_cache = Arc::new(LyricsCache::new("lyrics", config.lyrics.cache_ttl()));
    let translation_cache = Arc::new(TranslationCache::new(
        "translation",
        config.translation.cache_ttl(),
    ));

    let orchestrator = SyncOrchestrator::new(
        lyrics_source,
        translator,
        Arc::clone(&lyrics_cache),
        Arc::clone(&translation_cache),
    )
    .with_window(config.window());

    let track = TrackInfo::new(
        TrackSignature::new(&args.track_id, args.duration),
        &args.artist,
        &args.title,
        args.album.clone(),
    );
    let language = args
        .lang
        .as_deref()
        .unwrap_or(config.translation.default_language.as_str());

    if !args.follow {
        let result = orchestrator.resolve(&track, language, args.progress_ms).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    info!("Following {} - {} (Ctrl+C to stop)", track.artist, track.title);

    let start_ms = args.progress_ms.unwrap_or(0);
    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping");
                break;
            }
            _ = ticker.tick() => {
                let progress = start_ms.saturating_add(started.elapsed().as_millis_u64());
                match orchestrator.resolve(&track, language, Some(progress)).await {
                    Ok(result) => println!("{}", serde_json::to_string(&result)?),
                    Err(e) => warn!("Failed to resolve lyrics at {}ms: {}", progress, e),
                }
                lyrics_cache.purge_expired();
                translation_cache.purge_expired();
            }
        }
    }

    Ok(())
}

fn init_tracing(file_logging_enabled: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout stays clean JSON
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = lingualsync_core::paths::log_file_path();

        // Create cache directory if needed
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "lingualsync",
            "--track-id",
            "4uLU6hMCjMI75M1A2tKUQC",
            "--duration",
            "213",
            "--artist",
            "Rick Astley",
            "--title",
            "Never Gonna Give You Up",
            "--lang",
            "es",
            "--progress-ms",
            "42000",
        ])
        .unwrap();
        assert_eq!(args.duration, 213);
        assert_eq!(args.lang.as_deref(), Some("es"));
        assert_eq!(args.progress_ms, Some(42_000));
        assert!(args.album.is_none());
        assert!(!args.follow);
    }

    #[test]
    fn test_required_args() {
        assert!(Args::try_parse_from(["lingualsync", "--track-id", "x"]).is_err());
    }
}
