use crate::model::SessionKey;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

/// Événement émis par le lecteur
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEvent {
    pub session: SessionKey,
    pub kind: PlayerEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEventKind {
    Enqueued { title: String, position: usize },
    SchedulerStarted { scheduler: Uuid },
    NowPlaying { scheduler: Uuid, title: String },
    Finished { scheduler: Uuid, title: String },
    PlaybackFailed { scheduler: Uuid, title: String, reason: String },
    Disconnected { scheduler: Uuid, reason: DisconnectReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    IdleTimeout,
    Left,
}

/// Diffusion des événements ; un abonné en retard perd les plus anciens
#[derive(Debug, Clone)]
pub struct PlayerEventBus {
    tx: broadcast::Sender<PlayerEvent>,
}

impl Default for PlayerEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PlayerEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn broadcast(&self, session: &SessionKey, kind: PlayerEventKind) {
        let event = PlayerEvent {
            session: session.clone(),
            kind,
        };
        if self.tx.send(event).is_err() {
            trace!(session = %session, "No player event subscriber");
        }
    }
}
