use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tchcache::MediaItem;

/// Clé stable d'une session (un groupe de canaux)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Canal de destination audio
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    pub display_name: String,
}

impl Requester {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Élément de file : un média résolu, son demandeur et ses paroles éventuelles
///
/// Seul `lyrics` peut changer une fois l'élément en lecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub media: MediaItem,
    pub requester: Option<Requester>,
    pub lyrics: Option<String>,
}

impl QueueItem {
    pub fn new(media: MediaItem, requester: Option<Requester>) -> Self {
        Self {
            media,
            requester,
            lyrics: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.media.title
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.media.duration_secs)
    }
}

/// État du scheduler d'une session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    /// File vide, compteur d'inactivité en cours
    WaitingForNext,
    Disconnecting,
}

/// Position (1-based) et élément
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub position: usize,
    pub item: QueueItem,
}

/// Vue figée d'une file, pour affichage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueEntry>,
    pub total_duration_secs: u64,
}

impl QueueSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.item.title()).collect()
    }
}

/// Résultat d'une demande de lecture
///
/// Une playlist peut ajouter plusieurs éléments ; les entrées en échec sont
/// seulement comptées.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnqueueOutcome {
    pub added: Vec<QueueEntry>,
    pub failed: usize,
}
