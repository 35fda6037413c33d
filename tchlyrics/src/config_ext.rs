//! Extension pour configurer le client Genius depuis tchconfig

use crate::error::Result;
use crate::genius::{GeniusClient, DEFAULT_BASE_URL, DEFAULT_EXCLUDED_TERMS};
use tchconfig::Config;

pub trait LyricsConfigExt {
    /// URL de base de l'API
    fn get_lyrics_base_url(&self) -> String;

    /// Termes excluant un résultat de recherche
    fn get_lyrics_excluded_terms(&self) -> Vec<String>;

    /// Construit le client ; sans token, les recherches échouent avec `Unavailable`
    fn create_lyrics_client(&self) -> Result<GeniusClient>;
}

impl LyricsConfigExt for Config {
    fn get_lyrics_base_url(&self) -> String {
        self.get_string_or(&["lyrics", "base_url"], DEFAULT_BASE_URL)
    }

    fn get_lyrics_excluded_terms(&self) -> Vec<String> {
        let terms = self.get_string_list(&["lyrics", "excluded_terms"]);
        if terms.is_empty() {
            DEFAULT_EXCLUDED_TERMS.iter().map(|s| s.to_string()).collect()
        } else {
            terms
        }
    }

    fn create_lyrics_client(&self) -> Result<GeniusClient> {
        GeniusClient::builder()
            .maybe_token(self.get_lyrics_token())
            .base_url(self.get_lyrics_base_url())
            .excluded_terms(self.get_lyrics_excluded_terms())
            .build()
    }
}
