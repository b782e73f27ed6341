// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching episodes from a source.
///
/// Every variant is fatal for the whole run.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("Authentication against {url} failed: {reason}")]
    AuthFailed { url: String, reason: String },

    #[error("Failed to fetch {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read feed file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse RSS feed: {0}")]
    FeedParseFailed(#[from] rss::Error),

    #[error("Failed to parse API response from {url}: {source}")]
    JsonParseFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No feed location configured")]
    NoFeedLocations,

    #[error("All {attempts} feed locations failed, last error: {last}")]
    AllFeedsFailed {
        attempts: usize,
        #[source]
        last: Box<SourceError>,
    },
}

/// Errors that can occur when turning a raw record into an episode
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Episode record has no title")]
    MissingTitle,
}

/// Errors that can occur when loading or persisting the processed set
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read ledger {path}: {source}")]
    LedgerReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write ledger {path}: {source}")]
    LedgerWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse ledger JSON in {path}: {source}")]
    LedgerParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    LedgerSerializeFailed(#[from] serde_json::Error),
}

/// Errors that abort the materialization of a single episode
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Post directory already exists: {0}")]
    DirectoryExists(PathBuf),

    #[error("Failed to create post directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write document {path}: {source}")]
    WriteDocumentFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while saving a cover image.
///
/// These never fail the episode, they are only reported.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode image from {url}: {source}")]
    DecodeFailed {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Top-level errors for a sync run
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("State error: {0}")]
    State(#[from] StateError),
}
