//! Error types for media resolution

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors that can occur while turning a request into a playable item
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The search or the link yielded nothing
    #[error("No media found for: {0}")]
    NotFound(String),

    /// The backend is missing, misconfigured or failing
    #[error("Resolution backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Cache error: {0}")]
    Cache(#[from] tchcache::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// `true` when the request itself found nothing, as opposed to a failing backend
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
