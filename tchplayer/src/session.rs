//! État partagé d'une session
//!
//! Accédé à la fois par les requêtes (file, destination) et par le scheduler
//! (élément courant, état, annonce). Chaque champ a son propre verrou, tenu
//! brièvement ; aucun n'est gardé pendant une attente de lecture.

use crate::audio::AudioSession;
use crate::front::NoticeHandle;
use crate::model::{ChannelId, PlaybackState, QueueItem, SessionKey};
use crate::queue::SessionQueue;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scheduler actif : identifiant et jeton d'annulation
#[derive(Debug, Clone)]
pub(crate) struct SchedulerSlot {
    pub id: Uuid,
    pub cancel: CancellationToken,
}

pub struct Session {
    key: SessionKey,
    queue: Arc<SessionQueue>,
    audio: Arc<dyn AudioSession>,
    destination: Mutex<Option<ChannelId>>,
    current: Mutex<Option<QueueItem>>,
    state: Mutex<PlaybackState>,
    scheduler: Mutex<Option<SchedulerSlot>>,
    notice: Mutex<Option<NoticeHandle>>,
    /// titre -> paroles (None : recherche faite, rien trouvé)
    lyrics: tokio::sync::Mutex<HashMap<String, Option<String>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("queued", &self.queue.len())
            .field("state", &self.state())
            .finish()
    }
}

impl Session {
    pub(crate) fn new(key: SessionKey, audio: Arc<dyn AudioSession>) -> Self {
        Self {
            key,
            queue: Arc::new(SessionQueue::new()),
            audio,
            destination: Mutex::new(None),
            current: Mutex::new(None),
            state: Mutex::new(PlaybackState::Idle),
            scheduler: Mutex::new(None),
            notice: Mutex::new(None),
            lyrics: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn queue(&self) -> &Arc<SessionQueue> {
        &self.queue
    }

    pub fn audio(&self) -> &Arc<dyn AudioSession> {
        &self.audio
    }

    pub fn destination(&self) -> Option<ChannelId> {
        lock(&self.destination).clone()
    }

    /// Fixe la destination si aucune ne l'est ; retourne la destination en vigueur
    pub(crate) fn claim_destination(&self, channel: &ChannelId) -> ChannelId {
        lock(&self.destination)
            .get_or_insert_with(|| channel.clone())
            .clone()
    }

    pub fn current(&self) -> Option<QueueItem> {
        lock(&self.current).clone()
    }

    pub(crate) fn set_current(&self, item: Option<QueueItem>) {
        *lock(&self.current) = item;
    }

    /// Range des paroles sur l'élément courant s'il porte ce titre
    pub(crate) fn set_current_lyrics(&self, title: &str, text: &str) {
        if let Some(item) = lock(&self.current).as_mut() {
            if item.title() == title {
                item.lyrics = Some(text.to_string());
            }
        }
    }

    pub fn state(&self) -> PlaybackState {
        *lock(&self.state)
    }

    pub(crate) fn set_state(&self, state: PlaybackState) {
        *lock(&self.state) = state;
    }

    pub fn scheduler_id(&self) -> Option<Uuid> {
        lock(&self.scheduler).as_ref().map(|slot| slot.id)
    }

    /// Réserve l'emplacement du scheduler ; `None` si un scheduler est déjà actif
    pub(crate) fn claim_scheduler(&self) -> Option<SchedulerSlot> {
        let mut slot = lock(&self.scheduler);
        if slot.is_some() {
            return None;
        }
        let claimed = SchedulerSlot {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        };
        *slot = Some(claimed.clone());
        Some(claimed)
    }

    /// Libère l'emplacement s'il appartient encore au scheduler `id`
    pub(crate) fn release_scheduler(&self, id: Uuid) {
        let mut slot = lock(&self.scheduler);
        if slot.as_ref().is_some_and(|s| s.id == id) {
            *slot = None;
        }
    }

    pub(crate) fn cancel_scheduler(&self) {
        if let Some(slot) = lock(&self.scheduler).as_ref() {
            slot.cancel.cancel();
        }
    }

    pub(crate) fn replace_notice(&self, notice: Option<NoticeHandle>) -> Option<NoticeHandle> {
        std::mem::replace(&mut *lock(&self.notice), notice)
    }

    pub(crate) fn lyrics_memo(&self) -> &tokio::sync::Mutex<HashMap<String, Option<String>>> {
        &self.lyrics
    }
}
