//! Boucle de lecture d'une session
//!
//! ```text
//!   Idle ──► Playing ──► WaitingForNext ──► Disconnecting
//!               ▲              │
//!               └──────────────┘  (élément disponible)
//! ```
//!
//! Une boucle par session : elle prend un élément, le confie à l'AudioSession,
//! sonde `is_playing` à intervalle fixe jusqu'à la fin, puis recommence.
//! File vide pendant `idle_timeout` : la session est libérée et la connexion
//! fermée. Le jeton d'annulation (leave) est vérifié à chaque attente.

use crate::events::{DisconnectReason, PlayerEventBus, PlayerEventKind};
use crate::front::FrontEnd;
use crate::model::{PlaybackState, QueueItem};
use crate::registry::RegistryInner;
use crate::session::Session;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Durée de file vide avant déconnexion
    pub idle_timeout: Duration,
    /// Pas de sondage de l'AudioSession (une unité d'inactivité)
    pub poll_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SchedulerSettings {
    pub fn new(idle_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            idle_timeout,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Nombre d'intervalles vides avant déconnexion (arrondi au supérieur)
    pub fn idle_ticks(&self) -> u64 {
        let poll = self.poll_interval.as_millis().max(1);
        self.idle_timeout.as_millis().div_ceil(poll) as u64
    }
}

pub(crate) struct PlaybackScheduler {
    pub id: Uuid,
    pub session: Arc<Session>,
    pub registry: Weak<RegistryInner>,
    pub cancel: CancellationToken,
    pub settings: SchedulerSettings,
    pub front: Arc<dyn FrontEnd>,
    pub events: PlayerEventBus,
}

impl PlaybackScheduler {
    pub(crate) async fn run(self) {
        let key = self.session.key().clone();
        info!(session = %key, scheduler = %self.id, "▶️ Scheduler started");

        self.connect().await;

        let idle_ticks = self.settings.idle_ticks();
        let mut idle: u64 = 0;

        let reason = loop {
            if self.cancel.is_cancelled() {
                break DisconnectReason::Left;
            }

            if let Some(item) = self.session.queue().dequeue() {
                idle = 0;
                self.play_item(item).await;
                self.session.set_state(PlaybackState::WaitingForNext);
                continue;
            }

            self.session.set_state(PlaybackState::WaitingForNext);
            if idle >= idle_ticks {
                if self.release_idle() {
                    break DisconnectReason::IdleTimeout;
                }
                // Un élément est arrivé juste avant la libération
                idle = 0;
                continue;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break DisconnectReason::Left,
                _ = tokio::time::sleep(self.settings.poll_interval) => idle += 1,
            }
        };

        self.shutdown(reason).await;
    }

    /// Connecte l'AudioSession au canal de destination si ce n'est pas déjà fait
    ///
    /// Appelé au démarrage puis avant chaque élément : la destination peut
    /// n'être fixée qu'après le lancement du scheduler.
    async fn connect(&self) {
        let key = self.session.key();
        let Some(channel) = self.session.destination() else {
            debug!(session = %key, "No destination channel yet");
            return;
        };
        if self.session.audio().connected_channel().as_ref() == Some(&channel) {
            return;
        }
        match self.session.audio().connect(&channel).await {
            Ok(()) => debug!(session = %key, channel = %channel, "Audio connected"),
            Err(e) => warn!(session = %key, channel = %channel, error = %e, "Audio connection failed"),
        }
    }

    async fn play_item(&self, item: QueueItem) {
        let key = self.session.key();
        let title = item.title().to_string();

        self.retire_notice().await;
        self.session.set_state(PlaybackState::Playing);
        self.session.set_current(Some(item.clone()));

        self.connect().await;
        if let Err(e) = self.session.audio().play(&item.media.locator).await {
            warn!(
                session = %key,
                scheduler = %self.id,
                title = title.as_str(),
                error = %e,
                "Playback failed, skipping item"
            );
            self.session.set_current(None);
            self.events.broadcast(
                key,
                PlayerEventKind::PlaybackFailed {
                    scheduler: self.id,
                    title,
                    reason: e.to_string(),
                },
            );
            return;
        }

        info!(session = %key, identity = item.media.identity.as_str(), title = title.as_str(), "🎵 Now playing");
        let notice = self.front.now_playing(key, &item).await;
        self.session.replace_notice(notice);
        self.events.broadcast(
            key,
            PlayerEventKind::NowPlaying {
                scheduler: self.id,
                title: title.clone(),
            },
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
            if !self.session.audio().is_playing().await {
                break;
            }
        }

        self.session.set_current(None);
        debug!(session = %key, title = title.as_str(), "Item finished");
        self.events.broadcast(
            key,
            PlayerEventKind::Finished {
                scheduler: self.id,
                title,
            },
        );
    }

    async fn retire_notice(&self) {
        if let Some(notice) = self.session.replace_notice(None) {
            self.front.retire_notice(self.session.key(), notice).await;
        }
    }

    /// Demande au registre de libérer la session ; `false` si la file n'est plus vide
    fn release_idle(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.release_idle(&self.session, self.id),
            None => {
                self.session.release_scheduler(self.id);
                true
            }
        }
    }

    async fn shutdown(&self, reason: DisconnectReason) {
        let key = self.session.key();
        self.session.set_state(PlaybackState::Disconnecting);
        self.retire_notice().await;
        self.session.set_current(None);

        if let Err(e) = self.session.audio().disconnect().await {
            warn!(session = %key, error = %e, "Audio disconnection failed");
        }
        self.session.release_scheduler(self.id);

        info!(session = %key, scheduler = %self.id, ?reason, "⏹️ Scheduler stopped");
        self.events.broadcast(
            key,
            PlayerEventKind::Disconnected {
                scheduler: self.id,
                reason,
            },
        );
    }
}
