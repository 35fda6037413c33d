#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tchcache::{MediaCache, MediaItem};
use tchlyrics::{Lyrics, LyricsError, LyricsLookup};
use tchplayer::{
    AudioConnector, AudioSession, ChannelId, FrontEnd, NoticeHandle, PlayerError, PlayerEvent,
    PlayerEventKind, QueueItem, Requester, SchedulerSettings, SessionKey, SessionRegistry,
};
use tchsource::{CachedResolver, MediaResolver, SourceError};
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::time::Instant;

pub const VOICE: &str = "voice-1";
pub const OTHER_VOICE: &str = "voice-2";

pub fn link(id: &str) -> String {
    format!("https://youtu.be/{id}")
}

// ---------------------------------------------------------------- resolver

#[derive(Debug, Default)]
pub struct MockResolver {
    /// lien -> (titre, durée en secondes)
    catalog: Mutex<HashMap<String, (String, u64)>>,
    playlists: Mutex<HashMap<String, Vec<String>>>,
    fetches: AtomicUsize,
}

impl MockResolver {
    pub fn add(&self, id: &str, title: &str, duration_secs: u64) {
        self.catalog
            .lock()
            .unwrap()
            .insert(link(id), (title.to_string(), duration_secs));
    }

    pub fn add_playlist(&self, url: &str, ids: &[&str]) {
        self.playlists
            .lock()
            .unwrap()
            .insert(url.to_string(), ids.iter().map(|id| link(id)).collect());
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaResolver for MockResolver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> tchsource::Result<String> {
        let catalog = self.catalog.lock().unwrap();
        catalog
            .iter()
            .find(|(_, (title, _))| title.eq_ignore_ascii_case(query))
            .map(|(link, _)| link.clone())
            .ok_or_else(|| SourceError::not_found(query))
    }

    async fn fetch(&self, link: &str, identity: &str) -> tchsource::Result<MediaItem> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let (title, duration_secs) = self
            .catalog
            .lock()
            .unwrap()
            .get(link)
            .cloned()
            .ok_or_else(|| SourceError::not_found(link))?;
        Ok(MediaItem {
            identity: identity.to_string(),
            source_url: link.to_string(),
            title,
            duration_secs,
            locator: format!("mock://{identity}"),
            thumbnail: None,
        })
    }

    async fn playlist_entries(&self, url: &str) -> tchsource::Result<Vec<String>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------- audio

#[derive(Debug, Default)]
struct AudioState {
    connected: Option<ChannelId>,
    until: Option<Instant>,
    paused_remaining: Option<Duration>,
    plays: Vec<String>,
    connects: usize,
    disconnects: usize,
}

/// Sortie audio simulée : un élément « joue » pendant sa durée, en temps tokio
#[derive(Debug)]
pub struct MockAudio {
    durations: Arc<Mutex<HashMap<String, Duration>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    state: Mutex<AudioState>,
}

impl MockAudio {
    pub fn plays(&self) -> Vec<String> {
        self.state.lock().unwrap().plays.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused_remaining.is_some()
    }
}

#[async_trait]
impl AudioSession for MockAudio {
    async fn connect(&self, channel: &ChannelId) -> tchplayer::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.connected = Some(channel.clone());
        state.connects += 1;
        Ok(())
    }

    async fn play(&self, locator: &str) -> tchplayer::Result<()> {
        if self.state.lock().unwrap().connected.is_none() {
            return Err(PlayerError::NotConnected);
        }
        if self.failing.lock().unwrap().contains(locator) {
            return Err(PlayerError::playback_failure(format!("cannot decode {locator}")));
        }
        let duration = self
            .durations
            .lock()
            .unwrap()
            .get(locator)
            .copied()
            .unwrap_or(Duration::from_secs(1));
        let mut state = self.state.lock().unwrap();
        state.plays.push(locator.to_string());
        state.paused_remaining = None;
        state.until = Some(Instant::now() + duration);
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.paused_remaining.is_some() || state.until.is_some_and(|until| Instant::now() < until)
    }

    async fn pause(&self) -> tchplayer::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(until) = state.until.take() {
            state.paused_remaining = Some(until.saturating_duration_since(Instant::now()));
        }
        Ok(())
    }

    async fn resume(&self) -> tchplayer::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.paused_remaining.take() {
            state.until = Some(Instant::now() + remaining);
        }
        Ok(())
    }

    async fn stop(&self) -> tchplayer::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.until = None;
        state.paused_remaining = None;
        Ok(())
    }

    async fn disconnect(&self) -> tchplayer::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.until = None;
        state.paused_remaining = None;
        if state.connected.take().is_some() {
            state.disconnects += 1;
        }
        Ok(())
    }

    fn connected_channel(&self) -> Option<ChannelId> {
        self.state.lock().unwrap().connected.clone()
    }
}

#[derive(Debug, Default)]
pub struct MockConnector {
    durations: Arc<Mutex<HashMap<String, Duration>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    opened: Mutex<Vec<(SessionKey, Arc<MockAudio>)>>,
}

impl MockConnector {
    pub fn set_duration(&self, identity: &str, duration: Duration) {
        self.durations
            .lock()
            .unwrap()
            .insert(format!("mock://{identity}"), duration);
    }

    pub fn fail(&self, identity: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(format!("mock://{identity}"));
    }

    /// Sessions audio ouvertes pour `key`, dans l'ordre
    pub fn opened(&self, key: &SessionKey) -> Vec<Arc<MockAudio>> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, audio)| audio.clone())
            .collect()
    }

    pub fn last(&self, key: &SessionKey) -> Arc<MockAudio> {
        self.opened(key).pop().expect("no audio session opened")
    }
}

impl AudioConnector for MockConnector {
    fn open(&self, session: &SessionKey) -> Arc<dyn AudioSession> {
        let audio = Arc::new(MockAudio {
            durations: self.durations.clone(),
            failing: self.failing.clone(),
            state: Mutex::new(AudioState::default()),
        });
        self.opened
            .lock()
            .unwrap()
            .push((session.clone(), audio.clone()));
        audio
    }
}

// ---------------------------------------------------------------- front end

#[derive(Debug, Default)]
pub struct MockFrontEnd {
    channels: Mutex<HashMap<String, ChannelId>>,
    notices: Mutex<Vec<String>>,
    retired: Mutex<Vec<NoticeHandle>>,
}

impl MockFrontEnd {
    pub fn place(&self, requester: &Requester, channel: &str) {
        self.channels
            .lock()
            .unwrap()
            .insert(requester.id.clone(), ChannelId::new(channel));
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn retired(&self) -> Vec<NoticeHandle> {
        self.retired.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrontEnd for MockFrontEnd {
    fn requester_channel(&self, _session: &SessionKey, requester: &Requester) -> Option<ChannelId> {
        self.channels.lock().unwrap().get(&requester.id).cloned()
    }

    async fn now_playing(&self, _session: &SessionKey, item: &QueueItem) -> Option<NoticeHandle> {
        let mut notices = self.notices.lock().unwrap();
        notices.push(item.title().to_string());
        Some(NoticeHandle(format!("notice-{}", notices.len())))
    }

    async fn retire_notice(&self, _session: &SessionKey, notice: NoticeHandle) {
        self.retired.lock().unwrap().push(notice);
    }
}

// ---------------------------------------------------------------- lyrics

#[derive(Debug, Default)]
pub struct MockLyrics {
    texts: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockLyrics {
    pub fn add(&self, title: &str, text: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(title.to_string(), text.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LyricsLookup for MockLyrics {
    async fn search(&self, title: &str) -> tchlyrics::Result<Lyrics> {
        self.calls.lock().unwrap().push(title.to_string());
        let text = self
            .texts
            .lock()
            .unwrap()
            .get(title)
            .cloned()
            .ok_or_else(|| LyricsError::not_found(title))?;
        Ok(Lyrics {
            title: title.to_string(),
            artist: "Mock Artist".to_string(),
            text,
        })
    }
}

// ---------------------------------------------------------------- harness

pub struct Harness {
    pub registry: SessionRegistry,
    pub resolver: Arc<MockResolver>,
    pub cache: Arc<MediaCache>,
    pub connector: Arc<MockConnector>,
    pub front: Arc<MockFrontEnd>,
    pub lyrics: Arc<MockLyrics>,
    pub events: broadcast::Receiver<PlayerEvent>,
    _dir: TempDir,
}

impl Harness {
    pub fn new(idle_timeout_secs: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(MediaCache::new(dir.path()).unwrap());
        let resolver = Arc::new(MockResolver::default());
        let connector = Arc::new(MockConnector::default());
        let front = Arc::new(MockFrontEnd::default());
        let lyrics = Arc::new(MockLyrics::default());

        let registry = SessionRegistry::new(
            CachedResolver::new(resolver.clone(), cache.clone()),
            connector.clone(),
            front.clone(),
            lyrics.clone(),
            SchedulerSettings::new(
                Duration::from_secs(idle_timeout_secs),
                Duration::from_secs(1),
            ),
        );
        let events = registry.subscribe();

        Self {
            registry,
            resolver,
            cache,
            connector,
            front,
            lyrics,
            events,
            _dir: dir,
        }
    }

    /// Ajoute un média au catalogue avec sa durée de lecture
    pub fn media(&self, id: &str, title: &str, duration_secs: u64) {
        self.resolver.add(id, title, duration_secs);
        self.connector
            .set_duration(id, Duration::from_secs(duration_secs));
    }

    /// Demandeur placé dans `channel`
    pub fn requester(&self, id: &str, channel: &str) -> Requester {
        let requester = Requester::new(id, id.to_uppercase());
        self.front.place(&requester, channel);
        requester
    }

    /// Attend le prochain événement satisfaisant `pred`
    pub async fn wait_for<F>(&mut self, pred: F) -> PlayerEvent
    where
        F: Fn(&PlayerEventKind) -> bool,
    {
        let events = &mut self.events;
        tokio::time::timeout(Duration::from_secs(3600), async {
            loop {
                match events.recv().await {
                    Ok(event) if pred(&event.kind) => return event,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
                }
            }
        })
        .await
        .expect("timed out waiting for player event")
    }

    pub async fn wait_now_playing(&mut self, title: &str) -> PlayerEvent {
        let title = title.to_string();
        self.wait_for(move |kind| matches!(kind, PlayerEventKind::NowPlaying { title: t, .. } if *t == title))
            .await
    }

    pub async fn wait_finished(&mut self, title: &str) -> PlayerEvent {
        let title = title.to_string();
        self.wait_for(move |kind| matches!(kind, PlayerEventKind::Finished { title: t, .. } if *t == title))
            .await
    }

    pub async fn wait_disconnected(&mut self) -> PlayerEvent {
        self.wait_for(|kind| matches!(kind, PlayerEventKind::Disconnected { .. }))
            .await
    }

    /// Événements déjà émis, sans attendre
    pub fn drain(&mut self) -> Vec<PlayerEventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }
}
