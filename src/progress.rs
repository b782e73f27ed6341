// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted during a sync run for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Episodes are being fetched from the source
    FetchingEpisodes { source: String },

    /// The source returned its episode list
    EpisodesFetched { count: usize },

    /// The processed set has been loaded
    ProcessedSetLoaded { store: String, existing_count: usize },

    /// A new episode is about to be materialized
    EpisodeStarting {
        title: String,
        slug: String,
        date: String,
        /// Position of this episode in the source list
        episode_index: usize,
        total_episodes: usize,
    },

    /// The episode's slug is already processed
    EpisodeSkipped { title: String, slug: String },

    /// The cover image was saved
    CoverSaved { title: String, path: PathBuf },

    /// The post was created without a cover image
    CoverSkipped { title: String, reason: String },

    /// The post directory and document were created
    EpisodeCreated { title: String, path: PathBuf },

    /// The post exists but the processed store could not remember it
    RecordFailed {
        title: String,
        slug: String,
        error: String,
    },

    /// The episode could not be turned into a post
    EpisodeFailed { title: String, error: String },

    /// Sync run completed
    SyncCompleted {
        fetched_count: usize,
        added_count: usize,
        existing_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during a sync run.
///
/// Implementations can use this to print progress, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
