//! # tchplayer - Ordonnancement de la lecture par session
//!
//! Chaque session (un groupe de canaux) possède une file, au plus une boucle
//! de lecture active et au plus un élément en cours.
//!
//! ```text
//! requête ─► SessionRegistry ─► CachedResolver (tchsource + tchcache)
//!                  │
//!                  ├─► SessionQueue (enqueue, removeAt, clear, shuffle)
//!                  └─► PlaybackScheduler ─► AudioSession
//!                              │
//!                              └─► FrontEnd (annonces), PlayerEvent (broadcast)
//! ```
//!
//! - [`SessionRegistry`] : point d'entrée du front end (`play`, `pause`,
//!   `resume`, `skip`, `leave`, `remove_at`, `clear`, `shuffle`,
//!   `list_queue`, `now_playing`, `lyrics`)
//! - [`AudioSession`] / [`AudioConnector`] : transport audio, fourni par
//!   l'appelant ([`mpv::MpvConnector`] sous unix)
//! - [`FrontEnd`] : canal du demandeur et annonces « en cours de lecture »

pub mod audio;
#[cfg(feature = "tchconfig")]
pub mod config_ext;
mod control;
pub mod error;
pub mod events;
pub mod front;
pub mod model;
#[cfg(unix)]
pub mod mpv;
pub mod queue;
pub mod registry;
mod scheduler;
pub mod session;

pub use audio::{AudioConnector, AudioSession};
#[cfg(feature = "tchconfig")]
pub use config_ext::PlayerConfigExt;
pub use error::{PlayerError, Result};
pub use events::{DisconnectReason, PlayerEvent, PlayerEventBus, PlayerEventKind};
pub use front::{FrontEnd, NoticeHandle};
pub use model::{
    ChannelId, EnqueueOutcome, PlaybackState, QueueEntry, QueueItem, QueueSnapshot, Requester,
    SessionKey,
};
#[cfg(unix)]
pub use mpv::{MpvAudioSession, MpvConnector};
pub use queue::{parse_index, SessionQueue};
pub use registry::SessionRegistry;
pub use scheduler::{SchedulerSettings, DEFAULT_IDLE_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use session::Session;
