//! [`MediaResolver`] backed by the `yt-dlp` command line tool
//!
//! Every call spawns one `yt-dlp` process and parses the JSON it prints.
//! Downloads land in the media cache directory, named after the identity.

use crate::error::{Result, SourceError};
use crate::resolver::MediaResolver;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tchcache::MediaItem;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default `yt-dlp` executable
pub const DEFAULT_BINARY: &str = "yt-dlp";

/// Default format selector
pub const DEFAULT_FORMAT: &str = "bestaudio";

#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: String,
    format: String,
    download_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct YtInfo {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    #[serde(rename = "_filename")]
    filename: Option<String>,
    #[serde(default)]
    requested_downloads: Vec<YtDownload>,
    #[serde(default)]
    entries: Vec<Option<YtInfo>>,
}

#[derive(Debug, Deserialize)]
struct YtDownload {
    filepath: Option<String>,
}

impl YtInfo {
    /// Link of a (possibly flat) entry
    fn link(&self) -> Option<String> {
        let page = self
            .webpage_url
            .as_ref()
            .or(self.url.as_ref())
            .filter(|u| u.starts_with("http"));
        match (page, &self.id) {
            (Some(url), _) => Some(url.clone()),
            (None, Some(id)) => Some(format!("https://www.youtube.com/watch?v={id}")),
            (None, None) => None,
        }
    }
}

impl YtDlpResolver {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            download_dir: download_dir.into(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    async fn run_json(&self, args: &[&str]) -> Result<YtInfo> {
        debug!(binary = self.binary.as_str(), ?args, "Running yt-dlp");
        let output = Command::new(&self.binary)
            .arg("--no-warnings")
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                SourceError::backend_unavailable(format!("cannot run {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.lines().last().unwrap_or("").trim().to_string();
            warn!(status = %output.status, error = last.as_str(), "yt-dlp failed");
            return Err(SourceError::backend_unavailable(last));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

fn first_entry_link(info: &YtInfo) -> Option<String> {
    info.entries.iter().flatten().find_map(YtInfo::link)
}

fn entry_links(info: &YtInfo) -> Vec<String> {
    info.entries.iter().flatten().filter_map(YtInfo::link).collect()
}

fn media_from_info(info: YtInfo, link: &str, identity: &str) -> Result<MediaItem> {
    let locator = info
        .requested_downloads
        .iter()
        .find_map(|d| d.filepath.clone())
        .or(info.filename.clone())
        .ok_or_else(|| SourceError::backend_unavailable(format!("no file downloaded for {link}")))?;

    Ok(MediaItem {
        identity: identity.to_string(),
        source_url: info.webpage_url.clone().unwrap_or_else(|| link.to_string()),
        title: info.title.clone().unwrap_or_else(|| link.to_string()),
        duration_secs: info.duration.unwrap_or(0.0).max(0.0).round() as u64,
        locator,
        thumbnail: info.thumbnail,
    })
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn search(&self, query: &str) -> Result<String> {
        let target = format!("ytsearch1:{query}");
        let info = self.run_json(&["--flat-playlist", "-J", &target]).await?;
        first_entry_link(&info).ok_or_else(|| SourceError::not_found(query))
    }

    async fn fetch(&self, link: &str, identity: &str) -> Result<MediaItem> {
        let template = self
            .download_dir
            .join(format!("{identity}.%(ext)s"))
            .to_string_lossy()
            .to_string();
        let info = self
            .run_json(&[
                "--no-playlist",
                "-f",
                &self.format,
                "-o",
                &template,
                "--dump-single-json",
                "--no-simulate",
                link,
            ])
            .await?;
        media_from_info(info, link, identity)
    }

    async fn playlist_entries(&self, url: &str) -> Result<Vec<String>> {
        let info = self.run_json(&["--flat-playlist", "-J", url]).await?;
        Ok(entry_links(&info))
    }
}
