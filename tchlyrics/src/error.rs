//! Error types for the lyrics client

/// Result type alias for lyrics operations
pub type Result<T> = std::result::Result<T, LyricsError>;

/// Errors that can occur when looking up lyrics
#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    /// No credential configured, or the service refused it
    #[error("Lyrics service unavailable: {0}")]
    Unavailable(String),

    /// The search matched no song, or the song has no lyrics
    #[error("Lyrics not found: {0}")]
    NotFound(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl LyricsError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
