//! Erreurs du lecteur

use tchlyrics::LyricsError;
use tchsource::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Error, Debug)]
pub enum PlayerError {
    /// La résolution n'a rien donné
    #[error("Nothing found for: {0}")]
    NotFound(String),
    /// Index hors de `[1, taille]` ou non numérique
    #[error("Invalid queue index: {0}")]
    InvalidIndex(String),
    #[error("Requester does not share the session's channel")]
    Unauthorized,
    #[error("Resolution backend unavailable: {0}")]
    ResolutionBackendUnavailable(String),
    #[error("Playback failure: {0}")]
    PlaybackFailure(String),
    /// Demandeur hors de tout canal, ou session sans connexion audio
    #[error("Not connected to a channel")]
    NotConnected,
}

impl PlayerError {
    pub fn playback_failure(msg: impl Into<String>) -> Self {
        PlayerError::PlaybackFailure(msg.into())
    }

    pub fn invalid_index(token: impl Into<String>) -> Self {
        PlayerError::InvalidIndex(token.into())
    }
}

impl From<SourceError> for PlayerError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(what) => PlayerError::NotFound(what),
            SourceError::InvalidLink(link) => PlayerError::NotFound(link),
            other => PlayerError::ResolutionBackendUnavailable(other.to_string()),
        }
    }
}

impl From<LyricsError> for PlayerError {
    fn from(err: LyricsError) -> Self {
        match err {
            LyricsError::NotFound(what) => PlayerError::NotFound(what),
            other => PlayerError::ResolutionBackendUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_errors_map_to_player_kinds() {
        assert!(matches!(
            PlayerError::from(SourceError::not_found("x")),
            PlayerError::NotFound(_)
        ));
        assert!(matches!(
            PlayerError::from(SourceError::backend_unavailable("yt-dlp missing")),
            PlayerError::ResolutionBackendUnavailable(_)
        ));
    }

    #[test]
    fn test_lyrics_errors_map_to_player_kinds() {
        assert!(matches!(
            PlayerError::from(LyricsError::not_found("song")),
            PlayerError::NotFound(_)
        ));
        assert!(matches!(
            PlayerError::from(LyricsError::unavailable("no token")),
            PlayerError::ResolutionBackendUnavailable(_)
        ));
    }
}
