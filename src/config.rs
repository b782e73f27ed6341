// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SourceError;
use crate::http::DEFAULT_TIMEOUT;

/// Default document extension (Quarto markdown)
pub const DEFAULT_DOCUMENT_EXTENSION: &str = "qmd";

/// Client-credentials pair for the Spotify Web API
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Build credentials, failing if either half is absent or blank
    pub fn resolve(
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Result<Self, SourceError> {
        let client_id = client_id
            .filter(|s| !s.trim().is_empty())
            .ok_or(SourceError::MissingCredentials("SPOTIFY_CLIENT_ID"))?;
        let client_secret = client_secret
            .filter(|s| !s.trim().is_empty())
            .ok_or(SourceError::MissingCredentials("SPOTIFY_CLIENT_SECRET"))?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Where episodes come from
#[derive(Debug, Clone)]
pub enum SourceConfig {
    /// Spotify Web API, authenticated with the client-credentials flow
    Api {
        show_id: String,
        credentials: Credentials,
    },
    /// RSS feed locations (URLs or local paths), tried in order
    Feed {
        show_id: String,
        locations: Vec<String>,
    },
}

impl SourceConfig {
    /// Feed source using the well-known Anchor/Spotify feed URLs for a show
    pub fn default_feeds(show_id: &str) -> Self {
        Self::Feed {
            show_id: show_id.to_string(),
            locations: vec![
                format!("https://anchor.fm/s/{show_id}/podcast/rss"),
                format!("https://podcasters.spotify.com/pod/show/{show_id}/feed"),
            ],
        }
    }
}

/// What to do when a title collapses to a slug shorter than three characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlugFallback {
    /// `episode-<unix seconds>`; differs between calls in different seconds
    #[default]
    Timestamp,
    /// `episode-<sha256 prefix of the raw title>`; stable across runs
    TitleHash,
}

/// How the set of already-processed episodes is derived
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProcessedStoreConfig {
    /// Names of the subdirectories of the posts root
    #[default]
    Directory,
    /// A JSON ledger file
    Ledger(PathBuf),
}

/// Everything a sync run needs, resolved up front
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub posts_dir: PathBuf,
    pub store: ProcessedStoreConfig,
    pub document_extension: String,
    pub slug_fallback: SlugFallback,
    pub timeout: Duration,
}

impl PipelineConfig {
    /// Config with defaults for everything but the source and target directory
    pub fn new(source: SourceConfig, posts_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            posts_dir: posts_dir.into(),
            store: ProcessedStoreConfig::default(),
            document_extension: DEFAULT_DOCUMENT_EXTENSION.to_string(),
            slug_fallback: SlugFallback::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
