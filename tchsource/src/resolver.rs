//! Media resolution contract and the cache-aware resolution service

use crate::error::{Result, SourceError};
use crate::request::{canonical_identity, MediaRequest};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tchcache::{MediaCache, MediaItem};
use tracing::{debug, info};

/// Backend turning requests into downloadable media
///
/// Implementations only deal with the remote service. Caching and identity
/// handling are done by [`CachedResolver`].
#[async_trait]
pub trait MediaResolver: Debug + Send + Sync {
    /// Human readable backend name, for logs
    fn name(&self) -> &str;

    /// Searches free text and returns the canonical link of the best match
    ///
    /// Fails with [`SourceError::NotFound`] when nothing matches.
    async fn search(&self, query: &str) -> Result<String>;

    /// Fetches (downloads) the media behind `link`
    ///
    /// `identity` is the canonical identity of the link; backends may use it
    /// to name the downloaded file.
    async fn fetch(&self, link: &str, identity: &str) -> Result<MediaItem>;

    /// Lists the entry links of a playlist, in playlist order
    async fn playlist_entries(&self, url: &str) -> Result<Vec<String>>;
}

/// Resolution service combining a backend and the shared media cache
///
/// A link whose identity is already cached never reaches the backend, and
/// concurrent requests for the same identity share one download.
#[derive(Debug, Clone)]
pub struct CachedResolver {
    backend: Arc<dyn MediaResolver>,
    cache: Arc<MediaCache>,
}

impl CachedResolver {
    pub fn new(backend: Arc<dyn MediaResolver>, cache: Arc<MediaCache>) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &Arc<MediaCache> {
        &self.cache
    }

    /// Resolves free text: search, then resolve the resulting link
    pub async fn resolve_by_text(&self, query: &str) -> Result<MediaItem> {
        let link = self.backend.search(query).await?;
        debug!(backend = self.backend.name(), query, link = link.as_str(), "Search resolved");
        self.resolve_by_link(&link).await
    }

    /// Resolves a direct link through the cache
    pub async fn resolve_by_link(&self, link: &str) -> Result<MediaItem> {
        let identity = canonical_identity(link);
        info!(identity = identity.as_str(), url = link, "Resolving media");

        let backend = self.backend.clone();
        let key = identity.clone();
        let item = self
            .cache
            .get_or_fetch::<_, _, SourceError>(&identity, || async move {
                backend.fetch(link, &key).await
            })
            .await?;
        Ok(item)
    }

    /// Lists playlist entries, in order
    pub async fn resolve_playlist(&self, url: &str) -> Result<Vec<String>> {
        let entries = self.backend.playlist_entries(url).await?;
        if entries.is_empty() {
            return Err(SourceError::not_found(url));
        }
        debug!(url, count = entries.len(), "Playlist listed");
        Ok(entries)
    }

    /// Resolves a single-item request (text or link)
    ///
    /// Playlists must go through [`CachedResolver::resolve_playlist`].
    pub async fn resolve(&self, request: &MediaRequest) -> Result<MediaItem> {
        match request {
            MediaRequest::Text(query) => self.resolve_by_text(query).await,
            MediaRequest::Link(link) => self.resolve_by_link(link).await,
            MediaRequest::Playlist(url) => Err(SourceError::InvalidLink(format!(
                "{url} is a playlist, not a single media"
            ))),
        }
    }
}
