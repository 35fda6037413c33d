//! # tchsource - Media resolution for Tchama
//!
//! Turns what a user typed into playable media:
//!
//! - [`MediaRequest::classify`] sorts a request into playlist, direct link or text search
//! - [`canonical_identity`] reduces a link to the key used by the media cache
//! - [`MediaResolver`] is the contract a resolution backend implements
//! - [`CachedResolver`] puts the shared [`tchcache::MediaCache`] in front of a backend
//! - [`YtDlpResolver`] is a backend driving the `yt-dlp` tool
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tchcache::MediaCache;
//! use tchsource::{CachedResolver, MediaRequest, YtDlpResolver};
//!
//! # async fn demo() -> tchsource::Result<()> {
//! let cache = Arc::new(MediaCache::new("./cache_media")?);
//! let backend = Arc::new(YtDlpResolver::new(cache.cache_dir()));
//! let resolver = CachedResolver::new(backend, cache);
//!
//! let request = MediaRequest::classify("daft punk around the world")?;
//! let item = resolver.resolve(&request).await?;
//! println!("{} ({}s)", item.title, item.duration_secs);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "tchconfig")]
pub mod config_ext;
pub mod error;
pub mod request;
pub mod resolver;
pub mod ytdlp;

#[cfg(feature = "tchconfig")]
pub use config_ext::ResolverConfigExt;
pub use error::{Result, SourceError};
pub use request::{canonical_identity, MediaRequest};
pub use resolver::{CachedResolver, MediaResolver};
pub use ytdlp::YtDlpResolver;
