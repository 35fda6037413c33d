//! Registre des sessions
//!
//! Associe une clé de session à sa file et à son scheduler. L'ajout en file
//! et le démarrage du scheduler se font sous le verrou du registre, tout
//! comme la libération d'une session inactive : un élément ne peut donc pas
//! être ajouté à une session en cours de démontage.

use crate::audio::AudioConnector;
use crate::events::{PlayerEvent, PlayerEventBus, PlayerEventKind};
use crate::front::FrontEnd;
use crate::model::SessionKey;
use crate::queue::SessionQueue;
use crate::scheduler::{PlaybackScheduler, SchedulerSettings};
use crate::session::{lock, Session};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tchlyrics::LyricsLookup;
use tchsource::CachedResolver;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

pub(crate) struct RegistryInner {
    sessions: Mutex<HashMap<SessionKey, Arc<Session>>>,
    pub(crate) resolver: CachedResolver,
    pub(crate) connector: Arc<dyn AudioConnector>,
    pub(crate) front: Arc<dyn FrontEnd>,
    pub(crate) lyrics: Arc<dyn LyricsLookup>,
    pub(crate) settings: SchedulerSettings,
    pub(crate) events: PlayerEventBus,
}

impl RegistryInner {
    pub(crate) fn sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, Arc<Session>>> {
        lock(&self.sessions)
    }

    /// Session de `key`, créée si absente ; à appeler avec le verrou tenu
    pub(crate) fn session_entry(
        &self,
        sessions: &mut HashMap<SessionKey, Arc<Session>>,
        key: &SessionKey,
    ) -> Arc<Session> {
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(session = %key, "Creating session");
                Arc::new(Session::new(key.clone(), self.connector.open(key)))
            })
            .clone()
    }

    /// Lance un scheduler pour `session` s'il n'y en a pas ; à appeler avec le verrou tenu
    pub(crate) fn start_scheduler(self: &Arc<Self>, session: &Arc<Session>) -> bool {
        let Some(slot) = session.claim_scheduler() else {
            return false;
        };

        let scheduler = PlaybackScheduler {
            id: slot.id,
            session: session.clone(),
            registry: Arc::downgrade(self),
            cancel: slot.cancel,
            settings: self.settings,
            front: self.front.clone(),
            events: self.events.clone(),
        };
        self.events.broadcast(
            session.key(),
            PlayerEventKind::SchedulerStarted { scheduler: slot.id },
        );
        tokio::spawn(scheduler.run());
        true
    }

    /// Libère une session inactive
    ///
    /// Retourne `false` (et ne touche à rien) si la file a reçu un élément
    /// entre-temps.
    pub(crate) fn release_idle(&self, session: &Arc<Session>, scheduler: Uuid) -> bool {
        let mut sessions = self.sessions();
        if !session.queue().is_empty() {
            return false;
        }

        session.queue().clear();
        session.release_scheduler(scheduler);
        let key = session.key();
        if sessions
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            sessions.remove(key);
        }
        info!(session = %key, scheduler = %scheduler, "💤 Session idle, releasing");
        true
    }
}

/// Registre des sessions de lecture
///
/// Clonable à volonté ; toutes les copies partagent le même état.
#[derive(Clone)]
pub struct SessionRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.inner.sessions().len())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl SessionRegistry {
    pub fn new(
        resolver: CachedResolver,
        connector: Arc<dyn AudioConnector>,
        front: Arc<dyn FrontEnd>,
        lyrics: Arc<dyn LyricsLookup>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: Mutex::new(HashMap::new()),
                resolver,
                connector,
                front,
                lyrics,
                settings,
                events: PlayerEventBus::default(),
            }),
        }
    }

    /// File de la session `key`, créée au premier appel
    ///
    /// Seul le scheduler retire une session du registre (inactivité ou
    /// `leave`). Une session créée ici reste donc enregistrée tant que
    /// [`ensure_scheduler_running`](Self::ensure_scheduler_running) n'a pas
    /// été appelé pour elle.
    pub fn get_or_create_queue(&self, key: &SessionKey) -> Arc<SessionQueue> {
        let mut sessions = self.inner.sessions();
        self.inner
            .session_entry(&mut sessions, key)
            .queue()
            .clone()
    }

    /// Démarre le scheduler de `key` si aucun n'est actif
    ///
    /// Retourne `true` si un nouveau scheduler a été lancé. Doit être appelé
    /// depuis un runtime tokio.
    pub fn ensure_scheduler_running(&self, key: &SessionKey) -> bool {
        let mut sessions = self.inner.sessions();
        let session = self.inner.session_entry(&mut sessions, key);
        self.inner.start_scheduler(&session)
    }

    pub fn session(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.inner.sessions().get(key).cloned()
    }

    pub fn session_keys(&self) -> Vec<SessionKey> {
        self.inner.sessions().keys().cloned().collect()
    }

    pub fn resolver(&self) -> &CachedResolver {
        &self.inner.resolver
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.inner.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }
}
