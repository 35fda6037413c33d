//! Erreurs du cache de médias

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Un thread a paniqué en tenant la connexion SQLite
    #[error("Cache database lock poisoned")]
    Poisoned,
}
