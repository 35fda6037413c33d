//! Extension pour intégrer le cache de médias dans tchconfig

use crate::MediaCache;
use anyhow::Result;
use tchconfig::Config;

const DEFAULT_CACHE_DIR: &str = "cache_media";

/// Trait d'extension de `tchconfig::Config` pour le cache de médias
pub trait MediaCacheConfigExt {
    /// Répertoire du cache (absolu, créé si besoin)
    fn get_media_cache_dir(&self) -> Result<String>;

    /// Définit le répertoire du cache (absolu ou relatif au config_dir)
    fn set_media_cache_dir(&self, directory: String) -> Result<()>;

    /// Ouvre le cache configuré
    fn create_media_cache(&self) -> Result<MediaCache>;
}

impl MediaCacheConfigExt for Config {
    fn get_media_cache_dir(&self) -> Result<String> {
        self.get_managed_dir(&["media_cache", "directory"], DEFAULT_CACHE_DIR)
    }

    fn set_media_cache_dir(&self, directory: String) -> Result<()> {
        self.set_managed_dir(&["media_cache", "directory"], directory)
    }

    fn create_media_cache(&self) -> Result<MediaCache> {
        let dir = self.get_media_cache_dir()?;
        Ok(MediaCache::new(dir)?)
    }
}
