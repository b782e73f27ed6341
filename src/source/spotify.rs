// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Credentials;
use crate::error::SourceError;
use crate::http::HttpClient;

use super::{EpisodeSource, RawEpisode, SourceKind};

/// OAuth token endpoint for the client-credentials flow
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Base URL of the Spotify Web API
pub const API_BASE: &str = "https://api.spotify.com/v1";

/// Maximum page size of the show episodes endpoint.
///
/// Only one page is requested; larger shows are truncated.
pub const EPISODE_PAGE_LIMIT: u32 = 50;

const MARKET: &str = "US";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct EpisodesPage {
    #[serde(default)]
    items: Vec<Option<ApiEpisode>>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiEpisode {
    id: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Vec<ApiImage>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: String,
    width: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

/// Spotify Web API adapter listing the episodes of one show
pub struct SpotifyApiSource<C> {
    client: C,
    show_id: String,
    credentials: Credentials,
}

impl<C: HttpClient> SpotifyApiSource<C> {
    pub fn new(client: C, show_id: &str, credentials: Credentials) -> Self {
        Self {
            client,
            show_id: show_id.to_string(),
            credentials,
        }
    }

    /// Exchange the client credentials for a bearer token
    async fn authenticate(&self) -> Result<String, SourceError> {
        let auth_failed = |reason: String| SourceError::AuthFailed {
            url: TOKEN_URL.to_string(),
            reason,
        };

        let response = self
            .client
            .post_form(
                TOKEN_URL,
                (
                    self.credentials.client_id.as_str(),
                    self.credentials.client_secret.as_str(),
                ),
                "grant_type=client_credentials",
            )
            .await
            .map_err(|e| auth_failed(e.to_string()))?;

        if !response.is_success() {
            return Err(auth_failed(format!(
                "HTTP {}: {}",
                response.status,
                String::from_utf8_lossy(&response.body).trim()
            )));
        }

        let token: TokenResponse =
            serde_json::from_slice(&response.body).map_err(|e| auth_failed(e.to_string()))?;
        debug!("obtained Spotify access token");
        Ok(token.access_token)
    }

    fn episodes_url(&self) -> Result<Url, SourceError> {
        let limit = EPISODE_PAGE_LIMIT.to_string();
        Ok(Url::parse_with_params(
            &format!("{API_BASE}/shows/{}/episodes", self.show_id),
            &[("limit", limit.as_str()), ("market", MARKET)],
        )?)
    }
}

#[async_trait]
impl<C: HttpClient> EpisodeSource for SpotifyApiSource<C> {
    fn describe(&self) -> String {
        format!("Spotify show {}", self.show_id)
    }

    async fn fetch_raw_episodes(&self) -> Result<Vec<RawEpisode>, SourceError> {
        let token = self.authenticate().await?;
        let url = self.episodes_url()?;

        let response = self
            .client
            .get_bytes_with_bearer(url.as_str(), &token)
            .await
            .map_err(|e| SourceError::FetchFailed {
                url: url.to_string(),
                source: e,
            })?;

        if !response.is_success() {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let episodes = parse_episodes_page(&response.body, &self.show_id).map_err(|e| {
            SourceError::JsonParseFailed {
                url: url.to_string(),
                source: e,
            }
        })?;
        info!(show_id = %self.show_id, count = episodes.len(), "episodes fetched from API");
        Ok(episodes)
    }
}

/// Parse one page of the show episodes endpoint into raw records
pub fn parse_episodes_page(
    json: &[u8],
    show_id: &str,
) -> Result<Vec<RawEpisode>, serde_json::Error> {
    let page: EpisodesPage = serde_json::from_slice(json)?;

    if page.next.is_some() {
        warn!(
            limit = EPISODE_PAGE_LIMIT,
            "show has more episodes than one page, only the first page is processed"
        );
    }

    Ok(page
        .items
        .into_iter()
        .flatten()
        .map(|episode| to_raw(episode, show_id))
        .collect())
}

fn to_raw(episode: ApiEpisode, show_id: &str) -> RawEpisode {
    let mut images = episode.images;
    images.sort_by(|a, b| b.width.unwrap_or(0).cmp(&a.width.unwrap_or(0)));

    RawEpisode {
        title: episode.name,
        date: episode.release_date,
        description: episode.description,
        identifier: episode.id,
        link: episode.external_urls.and_then(|urls| urls.spotify),
        image_urls: images.into_iter().map(|image| image.url).collect(),
        ..RawEpisode::new(SourceKind::Api, show_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockHttpClient;

    const EPISODES_URL: &str =
        "https://api.spotify.com/v1/shows/show123/episodes?limit=50&market=US";

    const SAMPLE_PAGE: &str = r#"{
      "items": [
        {
          "id": "ep1",
          "name": "Episode #12: COVID Models!",
          "release_date": "2024-03-05",
          "description": "We talk about models.",
          "images": [
            {"url": "https://i.scdn.co/small.jpg", "width": 64, "height": 64},
            {"url": "https://i.scdn.co/large.jpg", "width": 640, "height": 640},
            {"url": "https://i.scdn.co/medium.jpg", "width": 300, "height": 300}
          ],
          "external_urls": {"spotify": "https://open.spotify.com/episode/ep1"}
        },
        null,
        {
          "id": "ep2",
          "name": "Second",
          "release_date": "2024",
          "description": ""
        }
      ],
      "next": null,
      "total": 2
    }"#;

    fn credentials() -> Credentials {
        Credentials::resolve(Some("id".to_string()), Some("secret".to_string())).unwrap()
    }

    #[test]
    fn parse_page_maps_fields() {
        let episodes = parse_episodes_page(SAMPLE_PAGE.as_bytes(), "show123").unwrap();
        assert_eq!(episodes.len(), 2);

        let ep1 = &episodes[0];
        assert_eq!(ep1.kind, SourceKind::Api);
        assert_eq!(ep1.identifier.as_deref(), Some("ep1"));
        assert_eq!(ep1.title.as_deref(), Some("Episode #12: COVID Models!"));
        assert_eq!(ep1.date.as_deref(), Some("2024-03-05"));
        assert_eq!(
            ep1.link.as_deref(),
            Some("https://open.spotify.com/episode/ep1")
        );
        assert_eq!(
            ep1.image_urls,
            vec![
                "https://i.scdn.co/large.jpg",
                "https://i.scdn.co/medium.jpg",
                "https://i.scdn.co/small.jpg"
            ]
        );

        let ep2 = &episodes[1];
        assert!(ep2.image_urls.is_empty());
        assert!(ep2.link.is_none());
    }

    #[test]
    fn episodes_url_requests_one_full_page() {
        let source = SpotifyApiSource::new(MockHttpClient::new(), "show123", credentials());
        assert_eq!(source.episodes_url().unwrap().as_str(), EPISODES_URL);
    }

    #[tokio::test]
    async fn fetch_authenticates_then_lists_episodes() {
        let client = MockHttpClient::new()
            .route(TOKEN_URL, 200, r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600}"#)
            .route(EPISODES_URL, 200, SAMPLE_PAGE);
        let source = SpotifyApiSource::new(client, "show123", credentials());

        let episodes = source.fetch_raw_episodes().await.unwrap();

        assert_eq!(episodes.len(), 2);
        assert_eq!(source.client.requested(), vec![TOKEN_URL, EPISODES_URL]);
    }

    #[tokio::test]
    async fn auth_failure_stops_before_fetching() {
        let client = MockHttpClient::new()
            .route(TOKEN_URL, 401, r#"{"error":"invalid_client"}"#)
            .route(EPISODES_URL, 200, SAMPLE_PAGE);
        let source = SpotifyApiSource::new(client, "show123", credentials());

        let err = source.fetch_raw_episodes().await.unwrap_err();

        assert!(matches!(err, SourceError::AuthFailed { .. }));
        assert!(err.to_string().contains("401"));
        assert_eq!(source.client.requested(), vec![TOKEN_URL]);
    }

    #[tokio::test]
    async fn non_success_listing_is_fatal() {
        let client = MockHttpClient::new()
            .route(TOKEN_URL, 200, r#"{"access_token":"tok"}"#)
            .route(EPISODES_URL, 503, "unavailable");
        let source = SpotifyApiSource::new(client, "show123", credentials());

        let err = source.fetch_raw_episodes().await.unwrap_err();
        assert!(matches!(err, SourceError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn unparsable_listing_is_fatal() {
        let client = MockHttpClient::new()
            .route(TOKEN_URL, 200, r#"{"access_token":"tok"}"#)
            .route(EPISODES_URL, 200, "<html>");
        let source = SpotifyApiSource::new(client, "show123", credentials());

        let err = source.fetch_raw_episodes().await.unwrap_err();
        assert!(matches!(err, SourceError::JsonParseFailed { .. }));
    }
}
