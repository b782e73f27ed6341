// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod config;
pub mod episode;
pub mod error;
pub mod http;
pub mod post;
pub mod progress;
pub mod source;
pub mod state;
pub mod sync;

// Re-export main types for convenience
pub use config::{Credentials, PipelineConfig, ProcessedStoreConfig, SlugFallback, SourceConfig};
pub use episode::{Episode, derive_categories, derive_topics, normalize, slugify};
pub use error::{ImageError, MaterializeError, NormalizeError, SourceError, StateError, SyncError};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use post::{CoverOutcome, MaterializedPost, materialize_episode, render_document};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use source::{EpisodeSource, FeedSource, RawEpisode, SourceKind, SpotifyApiSource};
pub use state::{DirectoryStore, LedgerStore, ProcessedSet, ProcessedStore};
pub use sync::{SyncResult, run_sync, sync_posts};
