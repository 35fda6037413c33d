mod command;
mod console;

use anyhow::Result;
use std::sync::Arc;
use tchcache::MediaCacheConfigExt;
use tchconfig::{Config, get_config};
use tchlyrics::LyricsConfigExt;
use tchplayer::{
    AudioConnector, PlayerConfigExt, PlayerEvent, PlayerEventKind, SessionRegistry,
};
use tchsource::{CachedResolver, ResolverConfigExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleFrontEnd;

/// `RUST_LOG` si défini, sinon le niveau configuré
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config
            .get_log_min_level()
            .unwrap_or_else(|_| "INFO".to_string());
        EnvFilter::new(level.to_lowercase())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

#[cfg(unix)]
fn audio_connector(config: &Config) -> Result<Arc<dyn AudioConnector>> {
    let socket_dir = config.get_managed_dir(&["audio", "socket_dir"], "sockets")?;
    Ok(Arc::new(tchplayer::MpvConnector::new(
        config.get_mpv_binary(),
        socket_dir,
    )))
}

#[cfg(not(unix))]
fn audio_connector(_config: &Config) -> Result<Arc<dyn AudioConnector>> {
    anyhow::bail!("no audio backend available on this platform")
}

/// Journalise les événements du lecteur
fn spawn_event_logger(mut events: broadcast::Receiver<PlayerEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PlayerEvent { session, kind }) => match kind {
                    PlayerEventKind::PlaybackFailed { title, reason, .. } => {
                        warn!(session = %session, title = title.as_str(), reason = reason.as_str(), "⚠️ Playback failed");
                    }
                    other => debug!(session = %session, event = ?other, "Player event"),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Event logger lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // ========== PHASE 1 : Configuration ==========
    let config = get_config();
    init_logging(&config);
    info!("⚙️ Configuration loaded from {}", config.directory());

    // ========== PHASE 2 : Cache et résolution ==========
    info!("💾 Opening media cache...");
    let cache = Arc::new(config.create_media_cache()?);
    info!(
        "✅ Media cache ready at {} ({} entries)",
        cache.cache_dir().display(),
        cache.count()?
    );

    let backend = Arc::new(config.create_ytdlp_resolver(cache.cache_dir()));
    let resolver = CachedResolver::new(backend, cache.clone());

    info!("🎤 Initializing lyrics client...");
    let lyrics = Arc::new(config.create_lyrics_client()?);

    // ========== PHASE 3 : Lecteur ==========
    let settings = config.scheduler_settings()?;
    info!(
        idle_timeout_secs = settings.idle_timeout.as_secs(),
        poll_interval_ms = settings.poll_interval.as_millis() as u64,
        "🎶 Starting player"
    );
    let registry = SessionRegistry::new(
        resolver,
        audio_connector(&config)?,
        Arc::new(ConsoleFrontEnd::new()),
        lyrics,
        settings,
    );
    spawn_event_logger(registry.subscribe());

    info!("✅ Tchama is ready! Type `help` for commands, Ctrl+C to stop");
    console::run(registry).await?;

    info!("👋 Tchama stopped");
    Ok(())
}
