//! # tchcache - Cache de médias dédupliqué pour Tchama
//!
//! Le cache associe une identité canonique de média (par exemple l'identifiant
//! d'une vidéo) à l'élément jouable déjà récupéré, et compte le nombre de mises
//! en file de chaque élément.
//!
//! ```text
//! tchcache
//!     ├── db.rs          - Table SQLite (identité, métadonnées, hits, last_used)
//!     ├── cache.rs       - MediaCache : lookup, insert_if_absent, get_or_fetch
//!     └── config_ext.rs  - Intégration tchconfig (répertoire du cache)
//! ```
//!
//! Aucune politique d'éviction n'est appliquée : les entrées vivent aussi
//! longtemps que le fichier de base.
//!
//! ```rust,no_run
//! use tchcache::{MediaCache, MediaItem};
//!
//! # fn main() -> tchcache::Result<()> {
//! let cache = MediaCache::new("./cache_media")?;
//! let stored = cache.insert_if_absent("dQw4w9WgXcQ", MediaItem {
//!     identity: String::new(),
//!     source_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
//!     title: "Never Gonna Give You Up".into(),
//!     duration_secs: 213,
//!     locator: "./cache_media/dQw4w9WgXcQ.webm".into(),
//!     thumbnail: None,
//! })?;
//! cache.increment_play_count(&stored.identity)?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
#[cfg(feature = "tchconfig")]
pub mod config_ext;
pub mod db;
pub mod error;

use serde::{Deserialize, Serialize};

pub use cache::MediaCache;
#[cfg(feature = "tchconfig")]
pub use config_ext::MediaCacheConfigExt;
pub use db::CacheEntry;
pub use error::{Error, Result};

/// Élément jouable résolu, partagé par toutes les sessions qui le demandent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Identité canonique (clé du cache)
    pub identity: String,
    /// Lien d'origine (page de la vidéo)
    pub source_url: String,
    pub title: String,
    pub duration_secs: u64,
    /// Chemin local ou URL diffusable
    pub locator: String,
    pub thumbnail: Option<String>,
}
