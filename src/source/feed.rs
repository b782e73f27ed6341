// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::http::HttpClient;

use super::{EpisodeSource, RawEpisode, SourceKind};

/// RSS feed adapter, trying each configured location until one succeeds
pub struct FeedSource<C> {
    client: C,
    show_id: String,
    locations: Vec<String>,
}

impl<C: HttpClient> FeedSource<C> {
    pub fn new(client: C, show_id: &str, locations: Vec<String>) -> Self {
        Self {
            client,
            show_id: show_id.to_string(),
            locations,
        }
    }

    async fn fetch_location(&self, location: &str) -> Result<Vec<RawEpisode>, SourceError> {
        let bytes = if is_url(location) {
            let response =
                self.client
                    .get_bytes(location)
                    .await
                    .map_err(|e| SourceError::FetchFailed {
                        url: location.to_string(),
                        source: e,
                    })?;

            if !response.is_success() {
                return Err(SourceError::HttpStatus {
                    url: location.to_string(),
                    status: response.status,
                });
            }
            response.body.to_vec()
        } else {
            read_feed_file(Path::new(location))?
        };

        parse_feed(&bytes, &self.show_id)
    }
}

#[async_trait]
impl<C: HttpClient> EpisodeSource for FeedSource<C> {
    fn describe(&self) -> String {
        format!("RSS feed {}", self.locations.join(", "))
    }

    async fn fetch_raw_episodes(&self) -> Result<Vec<RawEpisode>, SourceError> {
        let mut last_error = None;

        for (attempt, location) in self.locations.iter().enumerate() {
            debug!(attempt = attempt + 1, %location, "fetching feed");
            match self.fetch_location(location).await {
                Ok(episodes) => {
                    info!(%location, count = episodes.len(), "feed fetched");
                    return Ok(episodes);
                }
                Err(e) => {
                    warn!(%location, error = %e, "feed location failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            None => Err(SourceError::NoFeedLocations),
            Some(e) if self.locations.len() == 1 => Err(e),
            Some(e) => Err(SourceError::AllFeedsFailed {
                attempts: self.locations.len(),
                last: Box::new(e),
            }),
        }
    }
}

/// Read raw feed bytes from a local file
fn read_feed_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    std::fs::read(path).map_err(|e| SourceError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Determine if a feed location is a URL or a file path
pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Parse RSS feed XML bytes into raw episode records, in feed order
pub fn parse_feed(xml_bytes: &[u8], show_id: &str) -> Result<Vec<RawEpisode>, SourceError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    Ok(channel
        .items()
        .iter()
        .map(|item| parse_item(item, show_id))
        .collect())
}

fn parse_item(item: &rss::Item, show_id: &str) -> RawEpisode {
    let description = item
        .description()
        .filter(|d| !d.trim().is_empty())
        .or_else(|| item.content());

    RawEpisode {
        title: item.title().map(String::from),
        date: item.pub_date().map(String::from),
        description: description.map(String::from),
        enclosure_url: item.enclosure().map(|e| e.url().to_string()),
        guid: item.guid().map(|g| g.value().to_string()),
        link: item.link().map(String::from),
        image_urls: item_image_urls(item),
        ..RawEpisode::new(SourceKind::Feed, show_id)
    }
}

/// Collect item-level images: `itunes:image`, then `media:thumbnail`, then image `media:content`
fn item_image_urls(item: &rss::Item) -> Vec<String> {
    let mut urls: Vec<String> = item
        .itunes_ext()
        .and_then(|ext| ext.image())
        .map(String::from)
        .into_iter()
        .collect();

    if let Some(media) = item.extensions().get("media") {
        let thumbnails = media.get("thumbnail").into_iter().flatten();
        let contents = media
            .get("content")
            .into_iter()
            .flatten()
            .filter(|ext| {
                ext.attrs().get("medium").map(String::as_str) == Some("image")
                    || ext
                        .attrs()
                        .get("type")
                        .is_some_and(|t| t.starts_with("image/"))
            });

        urls.extend(
            thumbnails
                .chain(contents)
                .filter_map(|ext| ext.attrs().get("url").cloned()),
        );
    }

    urls.retain(|url| !url.trim().is_empty());
    urls
}
