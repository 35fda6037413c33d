//! Cache de médias partagé entre toutes les sessions
//!
//! Associe une identité canonique à l'élément jouable déjà résolu (fichier
//! téléchargé + métadonnées) et compte les mises en file. Les résolutions
//! concurrentes d'une même identité sont fusionnées : une seule récupération
//! est lancée et tous les appelants reçoivent la même entrée.

use crate::db::{CacheEntry, DB};
use crate::error::Result;
use crate::MediaItem;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

const TABLE_NAME: &str = "media";
const DB_FILE: &str = "cache.db";

type InFlight = Arc<OnceCell<MediaItem>>;

/// Cache de médias
///
/// Conçu pour être partagé derrière un `Arc<MediaCache>`. La base SQLite est
/// protégée par son propre mutex ; la map des résolutions en cours par un
/// mutex tokio tenu uniquement le temps d'y lire ou écrire une entrée.
pub struct MediaCache {
    /// Répertoire de stockage (base + fichiers téléchargés)
    dir: PathBuf,
    /// Base de données SQLite
    db: Arc<DB>,
    /// Résolutions en cours (identité -> cellule partagée)
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl std::fmt::Debug for MediaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCache").field("dir", &self.dir).finish()
    }
}

impl MediaCache {
    /// Ouvre (ou crée) un cache dans `dir`
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let directory = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory)?;
        let db = DB::init(&directory.join(DB_FILE), TABLE_NAME)?;

        Ok(Self {
            dir: directory,
            db: Arc::new(db),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Répertoire du cache, où les résolveurs déposent les fichiers
    pub fn cache_dir(&self) -> &Path {
        &self.dir
    }

    pub fn db(&self) -> &DB {
        &self.db
    }

    /// Élément stocké pour `identity`, s'il existe
    pub fn lookup(&self, identity: &str) -> Result<Option<MediaItem>> {
        Ok(self.db.get(identity)?.map(|entry| entry.item))
    }

    /// Stocke `item` sous `identity` seulement si l'identité est absente
    ///
    /// Retourne la valeur effectivement stockée : celle du premier écrivain.
    pub fn insert_if_absent(&self, identity: &str, item: MediaItem) -> Result<MediaItem> {
        let item = MediaItem {
            identity: identity.to_string(),
            ..item
        };
        let (entry, inserted) = self.db.insert_if_absent(&item)?;
        if inserted {
            debug!(identity, title = entry.item.title.as_str(), "Media cached");
        } else {
            debug!(identity, "Media already cached, keeping first entry");
        }
        Ok(entry.item)
    }

    /// Incrémente le compteur de lectures ; sans effet si l'identité est absente
    pub fn increment_play_count(&self, identity: &str) -> Result<()> {
        if !self.db.update_hit(identity)? {
            debug!(identity, "Play count not updated: identity not cached");
        }
        Ok(())
    }

    /// Compteur de lectures de `identity`
    pub fn play_count(&self, identity: &str) -> Result<Option<u64>> {
        Ok(self.db.get(identity)?.map(|entry| entry.hits))
    }

    pub fn entry(&self, identity: &str) -> Result<Option<CacheEntry>> {
        self.db.get(identity)
    }

    /// Toutes les entrées, les plus jouées d'abord
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        self.db.get_all()
    }

    pub fn count(&self) -> Result<usize> {
        self.db.count()
    }

    /// Retourne l'élément en cache ou le récupère avec `fetch`
    ///
    /// Les appels concurrents pour une même identité partagent une seule
    /// exécution de `fetch`. En cas d'échec, rien n'est stocké et l'appel
    /// suivant relance une récupération.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        identity: &str,
        fetch: F,
    ) -> std::result::Result<MediaItem, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<MediaItem, E>>,
        E: From<crate::Error>,
    {
        if let Some(item) = self.lookup(identity)? {
            debug!(identity, "Media cache hit");
            return Ok(item);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight
                .entry(identity.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell
            .get_or_try_init(|| async {
                // Un autre appelant a pu terminer entre-temps
                if let Some(item) = self.lookup(identity)? {
                    return Ok(item);
                }
                debug!(identity, "Media cache miss, fetching");
                let fetched = fetch().await?;
                Ok::<_, E>(self.insert_if_absent(identity, fetched)?)
            })
            .await
            .cloned();

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(identity)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
                && (cell.initialized() || result.is_err())
            {
                in_flight.remove(identity);
            }
        }

        result
    }
}
