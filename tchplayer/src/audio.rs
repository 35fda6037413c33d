//! Transport audio d'une session

use crate::error::Result;
use crate::model::{ChannelId, SessionKey};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Connexion audio vers un canal de destination
///
/// Une instance appartient à une seule session ; seul son scheduler lance
/// la lecture. Les opérations de contrôle (`pause`, `stop`...) sont des
/// signaux coopératifs : le scheduler observe leur effet via
/// [`AudioSession::is_playing`].
#[async_trait]
pub trait AudioSession: Debug + Send + Sync {
    async fn connect(&self, channel: &ChannelId) -> Result<()>;

    /// Démarre la lecture de `locator` et rend la main immédiatement
    async fn play(&self, locator: &str) -> Result<()>;

    /// `true` tant qu'un élément est chargé, y compris en pause
    async fn is_playing(&self) -> bool;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    /// Arrête l'élément courant ; vu par le scheduler comme une fin normale
    async fn stop(&self) -> Result<()>;

    /// Ferme la connexion ; sans effet si déjà fermée
    async fn disconnect(&self) -> Result<()>;

    fn connected_channel(&self) -> Option<ChannelId>;
}

/// Fabrique de connexions audio, une par session
pub trait AudioConnector: Debug + Send + Sync {
    fn open(&self, session: &SessionKey) -> Arc<dyn AudioSession>;
}
