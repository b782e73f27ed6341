// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;

use crate::error::NormalizeError;
use crate::source::{RawEpisode, SourceKind};

/// Description used when the source has none
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available for this episode.";

const EMBED_BASE: &str = "https://open.spotify.com/embed";
const EMBED_QUERY: &str = "utm_source=generator";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid HTML tag regex"));

static EPISODE_PATH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/episode/([a-zA-Z0-9]+)").expect("valid episode id regex"));

/// A canonical podcast episode, ready to be turned into a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub title: String,
    pub publish_date: NaiveDate,
    pub description: String,
    /// Platform episode id; empty when the source did not reveal one
    pub identifier: String,
    /// Source guid, kept so ledgers keyed on guids keep matching
    pub guid: Option<String>,
    pub image_url: Option<String>,
    /// Embeddable player URL for the episode, or for the whole show
    pub embed_url: String,
}

/// Map a raw record onto an [`Episode`].
///
/// Pure apart from `today`, which stands in for unparsable dates.
pub fn normalize(raw: &RawEpisode, today: NaiveDate) -> Result<Episode, NormalizeError> {
    let title = raw
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or(NormalizeError::MissingTitle)?
        .to_string();

    let publish_date = raw
        .date
        .as_deref()
        .and_then(|date| parse_date(raw.kind, date))
        .unwrap_or(today);

    let identifier = resolve_identifier(raw);
    let embed_url = if identifier.is_empty() {
        show_embed_url(raw.kind, &raw.show_id)
    } else {
        episode_embed_url(&identifier)
    };

    Ok(Episode {
        title,
        publish_date,
        description: clean_description(raw),
        identifier,
        guid: raw
            .guid
            .as_deref()
            .map(str::trim)
            .filter(|guid| !guid.is_empty())
            .map(String::from),
        image_url: raw
            .image_urls
            .iter()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
            .map(String::from),
        embed_url,
    })
}

/// Player URL for a single episode
pub fn episode_embed_url(identifier: &str) -> String {
    format!("{EMBED_BASE}/episode/{identifier}?{EMBED_QUERY}")
}

/// Player URL for the whole show; the feed variant embeds the video player
pub fn show_embed_url(kind: SourceKind, show_id: &str) -> String {
    match kind {
        SourceKind::Api => format!("{EMBED_BASE}/show/{show_id}?{EMBED_QUERY}"),
        SourceKind::Feed => format!("{EMBED_BASE}/show/{show_id}/video?{EMBED_QUERY}"),
    }
}

fn parse_date(kind: SourceKind, date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    match kind {
        SourceKind::Feed => DateTime::parse_from_rfc2822(date)
            .or_else(|_| parse_relaxed_date(date))
            .ok()
            .or_else(|| parse_ignoring_weekday(date))
            .map(|dt| dt.date_naive()),
        SourceKind::Api => parse_release_date(date),
    }
}

/// Try to parse feed dates that don't strictly conform to RFC 2822
fn parse_relaxed_date(date: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    let mut last_error = None;
    for format in formats {
        match DateTime::parse_from_str(date, format) {
            Ok(dt) => return Ok(dt),
            Err(e) => last_error = Some(e),
        }
    }

    DateTime::parse_from_rfc3339(date).map_err(|e| last_error.unwrap_or(e))
}

/// Feeds in the wild carry weekdays that don't match the date; drop the
/// weekday and parse what is left
fn parse_ignoring_weekday(date: &str) -> Option<DateTime<FixedOffset>> {
    let (_, rest) = date.split_once(',')?;
    let rest = rest.trim();
    DateTime::parse_from_rfc2822(rest)
        .or_else(|_| DateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S %z"))
        .ok()
}

/// API release dates come with day, month or year precision
fn parse_release_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{date}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{date}-01-01"), "%Y-%m-%d"))
        .ok()
}

fn clean_description(raw: &RawEpisode) -> String {
    let text = raw.description.as_deref().unwrap_or_default();

    let cleaned = match raw.kind {
        SourceKind::Feed => {
            let stripped = HTML_TAG.replace_all(text, "");
            html_escape::decode_html_entities(&stripped).trim().to_string()
        }
        SourceKind::Api => text.trim().to_string(),
    };

    if cleaned.is_empty() {
        DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        cleaned
    }
}

/// Explicit id first, then the enclosure URL, then the guid
fn resolve_identifier(raw: &RawEpisode) -> String {
    if let Some(id) = raw.identifier.as_deref().map(str::trim)
        && !id.is_empty()
    {
        return id.to_string();
    }

    let from_path = |text: &str| {
        EPISODE_PATH_ID
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    raw.enclosure_url
        .as_deref()
        .and_then(from_path)
        .or_else(|| {
            raw.guid.as_deref().and_then(|guid| match guid.split_once("spotify:episode:") {
                Some((_, id)) => Some(id.trim().to_string()).filter(|id| !id.is_empty()),
                None => from_path(guid),
            })
        })
        .unwrap_or_default()
}
