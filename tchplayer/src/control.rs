//! Requêtes du front end : lecture, contrôle, file et paroles
//!
//! Toute opération qui modifie la lecture ou la file d'une session active
//! exige que le demandeur soit dans le canal où la session est connectée.

use crate::error::{PlayerError, Result};
use crate::events::PlayerEventKind;
use crate::model::{ChannelId, EnqueueOutcome, QueueEntry, QueueItem, QueueSnapshot, Requester, SessionKey};
use crate::registry::SessionRegistry;
use crate::session::Session;
use std::sync::Arc;
use tchcache::MediaItem;
use tchlyrics::LyricsError;
use tchsource::MediaRequest;
use tracing::{debug, info, warn};

impl SessionRegistry {
    /// Résout `text` et l'ajoute à la file de `key`
    ///
    /// La résolution se fait hors de tout verrou ; seul l'ajout en file et le
    /// démarrage éventuel du scheduler sont faits sous le verrou du registre.
    pub async fn play(
        &self,
        key: &SessionKey,
        requester: &Requester,
        text: &str,
    ) -> Result<EnqueueOutcome> {
        let channel = self
            .inner
            .front
            .requester_channel(key, requester)
            .ok_or(PlayerError::NotConnected)?;

        match MediaRequest::classify(text)? {
            MediaRequest::Playlist(url) => self.enqueue_playlist(key, &channel, requester, &url).await,
            request => {
                let media = self.inner.resolver.resolve(&request).await?;
                let entry = self.enqueue_media(key, &channel, requester, media);
                Ok(EnqueueOutcome {
                    added: vec![entry],
                    failed: 0,
                })
            }
        }
    }

    /// Entrées résolues et ajoutées une par une : la lecture démarre dès la première
    async fn enqueue_playlist(
        &self,
        key: &SessionKey,
        channel: &ChannelId,
        requester: &Requester,
        url: &str,
    ) -> Result<EnqueueOutcome> {
        let links = self.inner.resolver.resolve_playlist(url).await?;
        info!(session = %key, url, entries = links.len(), "Enqueuing playlist");

        let mut outcome = EnqueueOutcome::default();
        for link in links {
            match self.inner.resolver.resolve_by_link(&link).await {
                Ok(media) => outcome
                    .added
                    .push(self.enqueue_media(key, channel, requester, media)),
                Err(e) => {
                    warn!(session = %key, link = link.as_str(), error = %e, "Playlist entry skipped");
                    outcome.failed += 1;
                }
            }
        }

        if outcome.added.is_empty() {
            return Err(PlayerError::NotFound(url.to_string()));
        }
        Ok(outcome)
    }

    fn enqueue_media(
        &self,
        key: &SessionKey,
        channel: &ChannelId,
        requester: &Requester,
        media: MediaItem,
    ) -> QueueEntry {
        let identity = media.identity.clone();
        let item = QueueItem::new(media, Some(requester.clone()));

        let position = {
            let mut sessions = self.inner.sessions();
            let session = self.inner.session_entry(&mut sessions, key);
            let destination = session.claim_destination(channel);
            if &destination != channel {
                warn!(
                    session = %key,
                    destination = %destination,
                    requested = %channel,
                    "Session already bound to another channel"
                );
            }
            let position = session.queue().enqueue(item.clone());
            self.inner.start_scheduler(&session);
            position
        };

        if let Err(e) = self.inner.resolver.cache().increment_play_count(&identity) {
            warn!(identity = identity.as_str(), error = %e, "Play count not updated");
        }
        debug!(session = %key, title = item.title(), position, "Enqueued");
        self.inner.events.broadcast(
            key,
            PlayerEventKind::Enqueued {
                title: item.title().to_string(),
                position,
            },
        );

        QueueEntry { position, item }
    }

    /// Session de `key` si le demandeur partage son canal connecté
    fn authorized_session(&self, key: &SessionKey, requester: &Requester) -> Result<Arc<Session>> {
        let session = self.session(key).ok_or(PlayerError::NotConnected)?;
        let connected = session
            .audio()
            .connected_channel()
            .ok_or(PlayerError::NotConnected)?;

        match self.inner.front.requester_channel(key, requester) {
            Some(channel) if channel == connected => Ok(session),
            _ => {
                debug!(session = %key, requester = requester.id.as_str(), "Control request rejected");
                Err(PlayerError::Unauthorized)
            }
        }
    }

    pub async fn pause(&self, key: &SessionKey, requester: &Requester) -> Result<()> {
        let session = self.authorized_session(key, requester)?;
        session.audio().pause().await?;
        debug!(session = %key, "Paused");
        Ok(())
    }

    pub async fn resume(&self, key: &SessionKey, requester: &Requester) -> Result<()> {
        let session = self.authorized_session(key, requester)?;
        session.audio().resume().await?;
        debug!(session = %key, "Resumed");
        Ok(())
    }

    /// Arrête l'élément courant ; le scheduler passe au suivant
    pub async fn skip(&self, key: &SessionKey, requester: &Requester) -> Result<()> {
        let session = self.authorized_session(key, requester)?;
        session.audio().stop().await?;
        debug!(session = %key, "Skipped");
        Ok(())
    }

    /// Vide la file, arrête le scheduler et ferme la connexion audio
    pub async fn leave(&self, key: &SessionKey, requester: &Requester) -> Result<()> {
        let session = self.authorized_session(key, requester)?;
        {
            let mut sessions = self.inner.sessions();
            if sessions
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &session))
            {
                sessions.remove(key);
            }
            session.queue().clear();
            session.cancel_scheduler();
        }

        if let Err(e) = session.audio().stop().await {
            debug!(session = %key, error = %e, "Stop before leaving failed");
        }
        session.audio().disconnect().await?;
        info!(session = %key, "👋 Left channel");
        Ok(())
    }

    pub fn remove_at(&self, key: &SessionKey, requester: &Requester, token: &str) -> Result<QueueItem> {
        let session = self.authorized_session(key, requester)?;
        let removed = session.queue().remove_at_token(token)?;
        debug!(session = %key, title = removed.title(), "Removed from queue");
        Ok(removed)
    }

    pub fn clear(&self, key: &SessionKey, requester: &Requester) -> Result<usize> {
        let session = self.authorized_session(key, requester)?;
        Ok(session.queue().clear())
    }

    pub fn shuffle(&self, key: &SessionKey, requester: &Requester) -> Result<()> {
        let session = self.authorized_session(key, requester)?;
        session.queue().shuffle();
        Ok(())
    }

    /// Vue de la file ; vide si la session n'existe pas
    pub fn list_queue(&self, key: &SessionKey) -> QueueSnapshot {
        self.session(key)
            .map(|session| session.queue().snapshot())
            .unwrap_or_default()
    }

    pub fn now_playing(&self, key: &SessionKey) -> Option<QueueItem> {
        self.session(key).and_then(|session| session.current())
    }

    /// Paroles d'un titre libre, ou de l'élément en cours
    ///
    /// Pour l'élément en cours, la recherche est faite au plus une fois par
    /// titre pendant la vie de la session, résultat négatif compris.
    pub async fn lyrics(&self, key: &SessionKey, query: Option<&str>) -> Result<String> {
        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            return Ok(self.inner.lyrics.search(query).await?.text);
        }

        let session = self.session(key).ok_or(PlayerError::NotConnected)?;
        let current = session
            .current()
            .ok_or_else(|| PlayerError::NotFound("nothing is playing".to_string()))?;
        if let Some(text) = current.lyrics {
            return Ok(text);
        }

        let title = current.media.title;
        let mut memo = session.lyrics_memo().lock().await;
        let cached = memo.get(&title).cloned();
        let found = match cached {
            Some(cached) => cached,
            None => match self.inner.lyrics.search(&title).await {
                Ok(lyrics) => {
                    memo.insert(title.clone(), Some(lyrics.text.clone()));
                    Some(lyrics.text)
                }
                Err(LyricsError::NotFound(_)) => {
                    memo.insert(title.clone(), None);
                    None
                }
                Err(e) => return Err(e.into()),
            },
        };
        drop(memo);

        match found {
            Some(text) => {
                session.set_current_lyrics(&title, &text);
                Ok(text)
            }
            None => Err(PlayerError::NotFound(title)),
        }
    }
}
