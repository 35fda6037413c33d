//! HTTP client for the Genius API
//!
//! The API only returns song metadata; the lyrics themselves are scraped from
//! the song page.
//!
//! # Example
//!
//! ```no_run
//! use tchlyrics::{GeniusClient, LyricsLookup};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeniusClient::builder().token("my-token").build()?;
//!     let lyrics = client.search("Daft Punk - Around the World").await?;
//!     println!("{} by {}\n\n{}", lyrics.title, lyrics.artist, lyrics.text);
//!     Ok(())
//! }
//! ```

use crate::error::{LyricsError, Result};
use crate::text::{clean_lyrics, search_query};
use crate::{Lyrics, LyricsLookup};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Node, Selector};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Genius API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.genius.com";

/// Default timeout for HTTP requests (15 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "Tchama/0.1 (tchlyrics)";

/// Hits whose title contains one of these are skipped
pub const DEFAULT_EXCLUDED_TERMS: &[&str] = &["(Remix)", "(Live)"];

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "type")]
    kind: String,
    result: SongHit,
}

#[derive(Debug, Clone, Deserialize)]
struct SongHit {
    title: String,
    url: String,
    primary_artist: Option<Artist>,
}

#[derive(Debug, Clone, Deserialize)]
struct Artist {
    name: String,
}

/// Genius API client
#[derive(Debug, Clone)]
pub struct GeniusClient {
    client: Client,
    token: Option<String>,
    base_url: String,
    excluded_terms: Vec<String>,
}

impl GeniusClient {
    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// `false` when no token is configured: every search then fails with `Unavailable`
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    async fn search_hit(&self, token: &str, query: &str) -> Result<SongHit> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LyricsError::unavailable(format!("token rejected ({status})")));
        }
        let envelope: SearchEnvelope = response.error_for_status()?.json().await?;

        pick_hit(&envelope.response, &self.excluded_terms)
            .cloned()
            .ok_or_else(|| LyricsError::not_found(query))
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl LyricsLookup for GeniusClient {
    async fn search(&self, title: &str) -> Result<Lyrics> {
        let Some(token) = self.token.as_deref() else {
            return Err(LyricsError::unavailable("no Genius token configured"));
        };

        let query = search_query(title);
        debug!(title, query = query.as_str(), "Searching lyrics");
        let hit = self.search_hit(token, &query).await?;

        let page = self.fetch_page(&hit.url).await?;
        let raw = extract_lyrics(&page).ok_or_else(|| LyricsError::not_found(&hit.title))?;

        Ok(Lyrics {
            title: hit.title,
            artist: hit.primary_artist.map(|a| a.name).unwrap_or_default(),
            text: clean_lyrics(&raw),
        })
    }
}

/// First song hit whose title contains none of the excluded terms
fn pick_hit<'a>(response: &'a SearchResponse, excluded: &[String]) -> Option<&'a SongHit> {
    response
        .hits
        .iter()
        .filter(|hit| hit.kind == "song")
        .map(|hit| &hit.result)
        .find(|song| !excluded.iter().any(|term| song.title.contains(term.as_str())))
}

/// Text of the lyrics containers of a song page, `<br>` turned into newlines
fn extract_lyrics(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"div[data-lyrics-container="true"]"#).ok()?;

    let mut text = String::new();
    for container in document.select(&selector) {
        for node in container.descendants() {
            match node.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(e) if e.name() == "br" => text.push('\n'),
                _ => {}
            }
        }
        text.push('\n');
    }

    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Builder for [`GeniusClient`]
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    token: Option<String>,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    excluded_terms: Vec<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            excluded_terms: DEFAULT_EXCLUDED_TERMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClientBuilder {
    /// API token; an empty string counts as no token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then(|| token.trim().to_string());
        self
    }

    pub fn maybe_token(self, token: Option<String>) -> Self {
        match token {
            Some(token) => self.token(token),
            None => Self { token: None, ..self },
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn excluded_terms(mut self, terms: Vec<String>) -> Self {
        self.excluded_terms = terms;
        self
    }

    pub fn build(self) -> Result<GeniusClient> {
        if self.token.is_none() {
            warn!("No Genius token configured, lyrics lookups are disabled");
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(GeniusClient {
            client,
            token: self.token,
            base_url: self.base_url,
            excluded_terms: self.excluded_terms,
        })
    }
}
