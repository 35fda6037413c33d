use crate::model::{ChannelId, QueueItem, Requester, SessionKey};
use async_trait::async_trait;
use std::fmt::Debug;

/// Référence vers une notification affichée par le front end
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoticeHandle(pub String);

/// Ce dont le lecteur a besoin du front end
#[async_trait]
pub trait FrontEnd: Debug + Send + Sync {
    /// Canal où se trouve actuellement le demandeur, s'il y en a un
    fn requester_channel(&self, session: &SessionKey, requester: &Requester) -> Option<ChannelId>;

    /// Annonce le début de lecture de `item`
    async fn now_playing(&self, session: &SessionKey, item: &QueueItem) -> Option<NoticeHandle>;

    /// Retire (supprime ou remplace) une annonce précédente
    async fn retire_notice(&self, session: &SessionKey, notice: NoticeHandle);
}
