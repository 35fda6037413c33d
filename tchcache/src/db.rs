//! Module de gestion de la base de données SQLite du cache de médias
//!
//! Une ligne par identité canonique. Les lignes ne sont jamais supprimées :
//! seules l'insertion (si absente) et l'incrément du compteur de lectures
//! modifient la table.

use crate::error::{Error, Result};
use crate::MediaItem;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Entrée de cache telle que stockée en base
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Élément jouable partagé par toutes les sessions
    pub item: MediaItem,
    /// Nombre de mises en file de cet élément
    pub hits: u64,
    /// Date/heure du dernier accès (RFC3339)
    pub last_used: Option<String>,
    /// Date/heure de la première résolution (RFC3339)
    pub created_at: String,
}

const COLUMNS: &str =
    "pk, source_url, title, duration_secs, locator, thumbnail, hits, last_used, created_at";

/// Base de données SQLite pour le cache de médias
#[derive(Debug)]
pub struct DB {
    conn: Mutex<Connection>,
    table_name: String,
}

impl DB {
    /// Initialise la base avec une table personnalisée
    ///
    /// ```rust,no_run
    /// use tchcache::db::DB;
    /// use std::path::Path;
    ///
    /// let db = DB::init(Path::new("cache.db"), "media").unwrap();
    /// ```
    pub fn init(path: &Path, table_name: &str) -> Result<Self> {
        let conn = Connection::open(path)?;

        let create_table_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                pk TEXT PRIMARY KEY,
                source_url TEXT NOT NULL,
                title TEXT NOT NULL,
                duration_secs INTEGER NOT NULL DEFAULT 0,
                locator TEXT NOT NULL,
                thumbnail TEXT,
                hits INTEGER NOT NULL DEFAULT 0,
                last_used TEXT,
                created_at TEXT NOT NULL
            )",
            table_name
        );
        conn.execute(&create_table_sql, [])?;

        // Index pour lister les éléments les plus joués
        let create_hits_index_sql = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_hits ON {} (hits DESC)",
            table_name, table_name
        );
        conn.execute(&create_hits_index_sql, [])?;

        Ok(Self {
            conn: Mutex::new(conn),
            table_name: table_name.to_string(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Poisoned)
    }

    fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
        let duration: i64 = row.get(3)?;
        let hits: i64 = row.get(6)?;
        Ok(CacheEntry {
            item: MediaItem {
                identity: row.get(0)?,
                source_url: row.get(1)?,
                title: row.get(2)?,
                duration_secs: duration.max(0) as u64,
                locator: row.get(4)?,
                thumbnail: row.get(5)?,
            },
            hits: hits.max(0) as u64,
            last_used: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    /// Insère l'élément s'il est absent et retourne l'entrée stockée
    ///
    /// Le booléen vaut `true` quand cet appel a créé l'entrée. Si l'identité
    /// existe déjà, la valeur stockée (la première) est retournée telle quelle.
    pub fn insert_if_absent(&self, item: &MediaItem) -> Result<(CacheEntry, bool)> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let sql = format!(
            "INSERT INTO {} ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7)
             ON CONFLICT(pk) DO NOTHING",
            self.table_name
        );
        let inserted = conn.execute(
            &sql,
            params![
                item.identity,
                item.source_url,
                item.title,
                item.duration_secs as i64,
                item.locator,
                item.thumbnail,
                now
            ],
        )? > 0;

        let select = format!("SELECT {COLUMNS} FROM {} WHERE pk = ?1", self.table_name);
        let entry = conn.query_row(&select, [&item.identity], Self::entry_from_row)?;
        Ok((entry, inserted))
    }

    /// Récupère une entrée par son identité
    pub fn get(&self, identity: &str) -> Result<Option<CacheEntry>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE pk = ?1", self.table_name);
        Ok(conn
            .query_row(&sql, [identity], Self::entry_from_row)
            .optional()?)
    }

    /// Incrémente le compteur de lectures et met à jour la date du dernier accès
    ///
    /// Retourne `false` si l'identité est inconnue (aucune ligne modifiée).
    pub fn update_hit(&self, identity: &str) -> Result<bool> {
        let conn = self.conn()?;
        let sql = format!(
            "UPDATE {} SET hits = hits + 1, last_used = ?1 WHERE pk = ?2",
            self.table_name
        );
        let changed = conn.execute(&sql, params![Utc::now().to_rfc3339(), identity])?;
        Ok(changed > 0)
    }

    /// Récupère toutes les entrées, triées par nombre d'accès décroissant
    pub fn get_all(&self) -> Result<Vec<CacheEntry>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {COLUMNS} FROM {} ORDER BY hits DESC, pk ASC",
            self.table_name
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Compte le nombre total d'entrées
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", self.table_name);
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
