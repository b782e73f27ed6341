// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod feed;
mod spotify;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::http::HttpClient;

pub use feed::{FeedSource, is_url, parse_feed};
pub use spotify::{EPISODE_PAGE_LIMIT, SpotifyApiSource, parse_episodes_page};

/// Which adapter produced a raw record; drives date parsing and embed fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Api,
    Feed,
}

/// An episode record as the source delivered it, before any cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEpisode {
    pub kind: SourceKind,
    pub show_id: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    /// Platform episode id, when the source states it directly
    pub identifier: Option<String>,
    pub enclosure_url: Option<String>,
    pub guid: Option<String>,
    pub link: Option<String>,
    /// Candidate cover images, best first
    pub image_urls: Vec<String>,
}

impl RawEpisode {
    /// An empty record for the given adapter and show
    pub fn new(kind: SourceKind, show_id: &str) -> Self {
        Self {
            kind,
            show_id: show_id.to_string(),
            title: None,
            date: None,
            description: None,
            identifier: None,
            enclosure_url: None,
            guid: None,
            link: None,
            image_urls: Vec::new(),
        }
    }
}

/// Anything that can list the episodes of a show.
///
/// The list is all-or-nothing: any error is fatal for the run.
#[async_trait]
pub trait EpisodeSource: Send + Sync {
    /// Human-readable description of where episodes come from
    fn describe(&self) -> String;

    /// Fetch every episode record the source exposes
    async fn fetch_raw_episodes(&self) -> Result<Vec<RawEpisode>, SourceError>;
}

/// Build the adapter selected by the configuration
pub fn source_from_config<C: HttpClient + 'static>(
    config: &SourceConfig,
    client: C,
) -> Box<dyn EpisodeSource> {
    match config {
        SourceConfig::Api {
            show_id,
            credentials,
        } => Box::new(SpotifyApiSource::new(client, show_id, credentials.clone())),
        SourceConfig::Feed { show_id, locations } => {
            Box::new(FeedSource::new(client, show_id, locations.clone()))
        }
    }
}
