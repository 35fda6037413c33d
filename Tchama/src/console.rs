//! Front end console : une session, un demandeur, la sortie audio locale

use crate::command::{Command, HELP};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tchplayer::{
    ChannelId, FrontEnd, NoticeHandle, PlayerError, QueueItem, QueueSnapshot, Requester,
    SessionKey, SessionRegistry,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

pub const SESSION_KEY: &str = "console";
pub const LOCAL_CHANNEL: &str = "local";

#[derive(Debug)]
pub struct ConsoleFrontEnd {
    channel: ChannelId,
    notices: AtomicU64,
}

impl Default for ConsoleFrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleFrontEnd {
    pub fn new() -> Self {
        Self {
            channel: ChannelId::new(LOCAL_CHANNEL),
            notices: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl FrontEnd for ConsoleFrontEnd {
    fn requester_channel(&self, _session: &SessionKey, _requester: &Requester) -> Option<ChannelId> {
        Some(self.channel.clone())
    }

    async fn now_playing(&self, _session: &SessionKey, item: &QueueItem) -> Option<NoticeHandle> {
        let requester = item
            .requester
            .as_ref()
            .map(|r| r.display_name.as_str())
            .unwrap_or("-");
        println!(
            "🎵 Now playing: {} [{}] requested by {}",
            item.title(),
            format_duration(item.media.duration_secs),
            requester
        );
        let n = self.notices.fetch_add(1, Ordering::Relaxed) + 1;
        Some(NoticeHandle(format!("notice-{n}")))
    }

    async fn retire_notice(&self, session: &SessionKey, notice: NoticeHandle) {
        debug!(session = %session, notice = notice.0.as_str(), "Now playing notice retired");
    }
}

/// `H:MM:SS`
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn format_queue(snapshot: &QueueSnapshot) -> String {
    if snapshot.is_empty() {
        return "Queue is empty".to_string();
    }
    let mut lines: Vec<String> = snapshot
        .entries
        .iter()
        .map(|entry| {
            let requester = entry
                .item
                .requester
                .as_ref()
                .map(|r| r.display_name.as_str())
                .unwrap_or("-");
            format!(
                "{}. {} {} {}",
                entry.position,
                entry.item.title(),
                format_duration(entry.item.media.duration_secs),
                requester
            )
        })
        .collect();
    lines.push(format!("Total: {}", format_duration(snapshot.total_duration_secs)));
    lines.join("\n")
}

/// Message affiché pour une erreur du lecteur
pub fn render_error(err: &PlayerError) -> String {
    match err {
        PlayerError::NotFound(what) => format!("❌ Nothing found for {what}"),
        PlayerError::InvalidIndex(index) => format!("❌ Invalid index: {index}"),
        PlayerError::Unauthorized => "❌ You must be in the player's channel".to_string(),
        PlayerError::NotConnected => "❌ The player is not connected".to_string(),
        PlayerError::ResolutionBackendUnavailable(_) => {
            "⚠️ Service unavailable, try again later".to_string()
        }
        PlayerError::PlaybackFailure(reason) => format!("⚠️ Playback failed: {reason}"),
    }
}

/// Exécute une commande et retourne la réponse à afficher
pub async fn handle(
    registry: &SessionRegistry,
    key: &SessionKey,
    requester: &Requester,
    command: Command,
) -> std::result::Result<String, PlayerError> {
    let reply = match command {
        Command::Play(text) => {
            let outcome = registry.play(key, requester, &text).await?;
            match outcome.added.as_slice() {
                [entry] => format!("➕ {}. {}", entry.position, entry.item.title()),
                entries => {
                    let mut reply = format!("➕ {} songs added", entries.len());
                    if outcome.failed > 0 {
                        reply.push_str(&format!(", {} failed", outcome.failed));
                    }
                    reply
                }
            }
        }
        Command::Pause => {
            registry.pause(key, requester).await?;
            "⏸️ Paused".to_string()
        }
        Command::Resume => {
            registry.resume(key, requester).await?;
            "▶️ Resumed".to_string()
        }
        Command::Skip => {
            registry.skip(key, requester).await?;
            "⏭️ Skipped".to_string()
        }
        Command::Leave => {
            registry.leave(key, requester).await?;
            "👋 Bye".to_string()
        }
        Command::List => {
            let mut reply = String::new();
            if let Some(current) = registry.now_playing(key) {
                reply.push_str(&format!("Now: {}\n", current.title()));
            }
            reply.push_str(&format_queue(&registry.list_queue(key)));
            reply
        }
        Command::Remove(token) => {
            let removed = registry.remove_at(key, requester, &token)?;
            format!("🗑️ Removed {}", removed.title())
        }
        Command::Clear => {
            let removed = registry.clear(key, requester)?;
            format!("🧹 {removed} songs removed")
        }
        Command::Shuffle => {
            registry.shuffle(key, requester)?;
            "🔀 Shuffled".to_string()
        }
        Command::Lyrics(query) => registry.lyrics(key, query.as_deref()).await?,
        Command::Ping => "pong".to_string(),
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(reply)
}

/// Boucle de lecture de stdin, jusqu'à `quit`, fin d'entrée ou Ctrl+C
pub async fn run(registry: SessionRegistry) -> Result<()> {
    let key = SessionKey::new(SESSION_KEY);
    let requester = Requester::new("console", whoami());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match handle(&registry, &key, &requester, command).await {
            Ok(reply) => println!("{reply}"),
            Err(e) => {
                warn!(session = %key, error = %e, "Command failed");
                println!("{}", render_error(&e));
            }
        }
    }

    // Libère la sortie audio si une session est encore active
    if registry.session(&key).is_some() {
        if let Err(e) = registry.leave(&key, &requester).await {
            debug!(error = %e, "Leave on shutdown failed");
        }
    }
    Ok(())
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "console".to_string())
}
