//! # tchlyrics - Lyrics lookup for Tchama
//!
//! - [`LyricsLookup`] is the contract the player depends on
//! - [`GeniusClient`] implements it against the Genius API
//! - [`text`] holds the query and lyrics clean-up helpers
//!
//! A client built without a token stays usable: every lookup fails with
//! [`LyricsError::Unavailable`].

#[cfg(feature = "tchconfig")]
pub mod config_ext;
pub mod error;
pub mod genius;
pub mod text;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tchconfig")]
pub use config_ext::LyricsConfigExt;
pub use error::{LyricsError, Result};
pub use genius::{ClientBuilder, GeniusClient, DEFAULT_BASE_URL};

/// Paroles d'une chanson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub title: String,
    pub artist: String,
    pub text: String,
}

/// Service de recherche de paroles à partir d'un titre
#[async_trait]
pub trait LyricsLookup: std::fmt::Debug + Send + Sync {
    /// Paroles de la meilleure correspondance pour `title`
    async fn search(&self, title: &str) -> Result<Lyrics>;
}
