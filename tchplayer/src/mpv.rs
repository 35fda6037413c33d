//! AudioSession pilotant un processus mpv par son socket IPC JSON
//!
//! Un processus `mpv --idle=yes --no-video` par session connectée. Les
//! commandes sont envoyées une à une ; les événements non sollicités reçus
//! en attendant une réponse sont ignorés.

use crate::audio::{AudioConnector, AudioSession};
use crate::error::{PlayerError, Result};
use crate::model::{ChannelId, SessionKey};
use crate::session::lock;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_MPV_BINARY: &str = "mpv";

const CONNECT_ATTEMPTS: usize = 50;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Ouvre une [`MpvAudioSession`] par session, sockets dans `socket_dir`
#[derive(Debug, Clone)]
pub struct MpvConnector {
    binary: String,
    socket_dir: PathBuf,
}

impl MpvConnector {
    pub fn new(binary: impl Into<String>, socket_dir: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.into(),
            socket_dir: socket_dir.as_ref().to_path_buf(),
        }
    }
}

impl AudioConnector for MpvConnector {
    fn open(&self, session: &SessionKey) -> Arc<dyn AudioSession> {
        let name: String = session
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .take(32)
            .collect();
        // Un socket par ouverture : une clé assainie n'est pas unique, et une
        // session recréée ne doit pas hériter du socket de la précédente
        let suffix = Uuid::new_v4().simple().to_string();
        let socket = self
            .socket_dir
            .join(format!("mpv-{name}-{}.sock", &suffix[..12]));
        Arc::new(MpvAudioSession::new(self.binary.clone(), socket))
    }
}

struct MpvProcess {
    child: Child,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl MpvProcess {
    async fn command(&mut self, args: Value) -> Result<Value> {
        let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&json!({ "command": args, "request_id": request_id }))
            .map_err(|e| PlayerError::playback_failure(e.to_string()))?;
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| PlayerError::playback_failure(format!("mpv IPC write: {e}")))?;

        tokio::time::timeout(REPLY_TIMEOUT, self.read_reply(request_id))
            .await
            .map_err(|_| PlayerError::playback_failure(format!("mpv IPC timeout (request {request_id})")))?
    }

    async fn read_reply(&mut self, request_id: u64) -> Result<Value> {
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = self
                .reader
                .read_line(&mut buf)
                .await
                .map_err(|e| PlayerError::playback_failure(format!("mpv IPC read: {e}")))?;
            if n == 0 {
                return Err(PlayerError::playback_failure("mpv IPC closed"));
            }

            let Ok(reply) = serde_json::from_str::<Value>(&buf) else {
                continue;
            };
            if reply.get("request_id").and_then(Value::as_u64) != Some(request_id) {
                // événement ou réponse à une autre requête
                continue;
            }
            return match reply.get("error").and_then(Value::as_str) {
                Some("success") | None => Ok(reply.get("data").cloned().unwrap_or(Value::Null)),
                Some(err) => Err(PlayerError::playback_failure(format!("mpv: {err}"))),
            };
        }
    }
}

/// Sortie audio locale via mpv
pub struct MpvAudioSession {
    binary: String,
    socket: PathBuf,
    process: tokio::sync::Mutex<Option<MpvProcess>>,
    channel: Mutex<Option<ChannelId>>,
}

impl std::fmt::Debug for MpvAudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpvAudioSession")
            .field("binary", &self.binary)
            .field("socket", &self.socket)
            .field("channel", &self.connected_channel())
            .finish()
    }
}

impl MpvAudioSession {
    pub fn new(binary: impl Into<String>, socket: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            socket: socket.into(),
            process: tokio::sync::Mutex::new(None),
            channel: Mutex::new(None),
        }
    }

    async fn spawn(&self) -> Result<MpvProcess> {
        if self.socket.exists() {
            let _ = tokio::fs::remove_file(&self.socket).await;
        }

        let child = Command::new(&self.binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", self.socket.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::playback_failure(format!("cannot start {}: {e}", self.binary)))?;

        for _ in 0..CONNECT_ATTEMPTS {
            match UnixStream::connect(&self.socket).await {
                Ok(stream) => {
                    let (read, write) = stream.into_split();
                    debug!(socket = %self.socket.display(), "Connected to mpv IPC");
                    return Ok(MpvProcess {
                        child,
                        reader: BufReader::new(read),
                        writer: write,
                    });
                }
                Err(_) => tokio::time::sleep(CONNECT_RETRY_DELAY).await,
            }
        }
        Err(PlayerError::playback_failure(format!(
            "mpv IPC socket {} never appeared",
            self.socket.display()
        )))
    }

    async fn command(&self, args: Value) -> Result<Value> {
        let mut process = self.process.lock().await;
        let process = process.as_mut().ok_or(PlayerError::NotConnected)?;
        process.command(args).await
    }
}

#[async_trait]
impl AudioSession for MpvAudioSession {
    async fn connect(&self, channel: &ChannelId) -> Result<()> {
        let mut process = self.process.lock().await;
        if process.is_none() {
            *process = Some(self.spawn().await?);
        }
        *lock(&self.channel) = Some(channel.clone());
        Ok(())
    }

    async fn play(&self, locator: &str) -> Result<()> {
        self.command(json!(["loadfile", locator, "replace"])).await?;
        self.command(json!(["set_property", "pause", false])).await?;
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        match self.command(json!(["get_property", "idle-active"])).await {
            Ok(Value::Bool(idle)) => !idle,
            Ok(_) => false,
            Err(e) => {
                // Processus perdu : l'élément est considéré terminé
                warn!(error = %e, "mpv status unavailable");
                false
            }
        }
    }

    async fn pause(&self) -> Result<()> {
        self.command(json!(["set_property", "pause", true])).await.map(|_| ())
    }

    async fn resume(&self) -> Result<()> {
        self.command(json!(["set_property", "pause", false])).await.map(|_| ())
    }

    async fn stop(&self) -> Result<()> {
        self.command(json!(["stop"])).await.map(|_| ())
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(mut process) = self.process.lock().await.take() else {
            *lock(&self.channel) = None;
            return Ok(());
        };

        if let Err(e) = process.command(json!(["quit"])).await {
            debug!(error = %e, "mpv quit command failed");
        }
        if tokio::time::timeout(QUIT_TIMEOUT, process.child.wait()).await.is_err() {
            warn!(socket = %self.socket.display(), "mpv did not quit, killing it");
            let _ = process.child.kill().await;
        }
        let _ = tokio::fs::remove_file(&self.socket).await;
        *lock(&self.channel) = None;
        Ok(())
    }

    fn connected_channel(&self) -> Option<ChannelId> {
        lock(&self.channel).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket_of(session: &Arc<dyn AudioSession>) -> String {
        let debug = format!("{session:?}");
        let start = debug.find("mpv-").unwrap();
        let end = debug[start..].find(".sock").unwrap() + start;
        debug[start..end].to_string()
    }

    #[test]
    fn test_connector_socket_name_is_sanitized() {
        let connector = MpvConnector::new("mpv", "/tmp");
        let session = connector.open(&SessionKey::new("guild/42:voice"));
        assert!(socket_of(&session).starts_with("mpv-guild_42_voice-"));
        assert!(session.connected_channel().is_none());
    }

    #[test]
    fn test_connector_socket_is_unique_per_open() {
        let connector = MpvConnector::new("mpv", "/tmp");
        let colon = socket_of(&connector.open(&SessionKey::new("a:b")));
        let underscore = socket_of(&connector.open(&SessionKey::new("a_b")));
        assert_ne!(colon, underscore);

        let first = socket_of(&connector.open(&SessionKey::new("guild-1")));
        let again = socket_of(&connector.open(&SessionKey::new("guild-1")));
        assert_ne!(first, again);
    }

    #[tokio::test]
    async fn test_commands_without_process_fail() {
        let session = MpvAudioSession::new("mpv", "/tmp/tchama-test-unused.sock");
        assert!(matches!(
            session.play("/tmp/x.webm").await,
            Err(PlayerError::NotConnected)
        ));
        assert!(!session.is_playing().await);
        assert!(session.disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_playback_failure() {
        let session = MpvAudioSession::new(
            "/nonexistent/tchama-mpv",
            std::env::temp_dir().join("tchama-missing-mpv.sock"),
        );
        let err = session.connect(&ChannelId::new("local")).await.unwrap_err();
        assert!(matches!(err, PlayerError::PlaybackFailure(_)));
        assert!(session.connected_channel().is_none());
    }
}
