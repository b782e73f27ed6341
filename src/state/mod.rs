// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod directory;
mod ledger;

use std::collections::HashSet;
use std::path::Path;

use crate::config::ProcessedStoreConfig;
use crate::episode::Episode;
use crate::error::StateError;

pub use directory::DirectoryStore;
pub use ledger::{LedgerEntry, LedgerFile, LedgerRecord, LedgerStore};

/// How a slug relates to what has already been materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Never seen, should be materialized
    New,
    /// Present when the run started
    Existing,
    /// Materialized earlier in this same run
    AddedThisRun,
}

/// Slugs considered already materialized.
///
/// Snapshotted once when a run starts and only grown as the run adds posts.
/// Ledgers written by older tooling only know source guids, those are kept
/// alongside the slugs.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    existing: HashSet<String>,
    existing_guids: HashSet<String>,
    added: HashSet<String>,
}

impl ProcessedSet {
    pub fn new(existing: HashSet<String>) -> Self {
        Self {
            existing,
            existing_guids: HashSet::new(),
            added: HashSet::new(),
        }
    }

    /// Also treat episodes with one of these guids as processed
    pub fn with_guids(mut self, guids: HashSet<String>) -> Self {
        self.existing_guids = guids;
        self
    }

    /// Exact-match membership test against the snapshot and this run's additions
    pub fn check(&self, slug: &str) -> Membership {
        if self.existing.contains(slug) {
            Membership::Existing
        } else if self.added.contains(slug) {
            Membership::AddedThisRun
        } else {
            Membership::New
        }
    }

    /// Like [`ProcessedSet::check`], but a known guid also counts as existing
    pub fn check_episode(&self, slug: &str, guid: Option<&str>) -> Membership {
        match guid {
            Some(guid) if self.existing_guids.contains(guid) => Membership::Existing,
            _ => self.check(slug),
        }
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.check(slug) != Membership::New
    }

    /// Remember a slug materialized during this run
    pub fn mark_added(&mut self, slug: &str) {
        self.added.insert(slug.to_string());
    }

    /// Number of slugs and guids known when the run started
    pub fn existing_len(&self) -> usize {
        self.existing.len() + self.existing_guids.len()
    }
}

/// Backing storage for the processed set.
///
/// The driver loads once, then records each episode it materializes.
pub trait ProcessedStore {
    /// Short description for progress output
    fn describe(&self) -> String;

    /// Read the set of already-processed slugs
    fn load(&mut self) -> Result<ProcessedSet, StateError>;

    /// Persist that `slug` has been materialized for `episode`
    fn record(&mut self, slug: &str, episode: &Episode) -> Result<(), StateError>;
}

/// Build the store selected by the configuration
pub fn store_from_config(config: &ProcessedStoreConfig, posts_dir: &Path) -> Box<dyn ProcessedStore> {
    match config {
        ProcessedStoreConfig::Directory => Box::new(DirectoryStore::new(posts_dir)),
        ProcessedStoreConfig::Ledger(path) => Box::new(LedgerStore::new(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn membership_distinguishes_snapshot_from_run() {
        let mut set = ProcessedSet::new(HashSet::from(["old-episode".to_string()]));

        assert_eq!(set.check("old-episode"), Membership::Existing);
        assert_eq!(set.check("new-episode"), Membership::New);

        set.mark_added("new-episode");
        assert_eq!(set.check("new-episode"), Membership::AddedThisRun);
        assert!(set.contains("new-episode"));
        assert_eq!(set.existing_len(), 1);
    }

    #[test]
    fn known_guid_marks_episode_existing() {
        let set = ProcessedSet::new(HashSet::new())
            .with_guids(HashSet::from(["spotify:episode:abc".to_string()]));

        assert_eq!(
            set.check_episode("renamed-episode", Some("spotify:episode:abc")),
            Membership::Existing
        );
        assert_eq!(
            set.check_episode("renamed-episode", Some("spotify:episode:xyz")),
            Membership::New
        );
        assert_eq!(set.check_episode("renamed-episode", None), Membership::New);
        assert_eq!(set.existing_len(), 1);
    }

    #[test]
    fn membership_is_exact_match() {
        let set = ProcessedSet::new(HashSet::from(["episode-1".to_string()]));
        assert!(!set.contains("episode-10"));
        assert!(!set.contains("Episode-1"));
        assert!(!set.contains("episode"));
    }

    #[test]
    fn store_from_config_picks_backend() {
        let posts = PathBuf::from("posts");
        let directory = store_from_config(&ProcessedStoreConfig::Directory, &posts);
        assert!(directory.describe().contains("posts"));

        let ledger = store_from_config(
            &ProcessedStoreConfig::Ledger(PathBuf::from("state.json")),
            &posts,
        );
        assert!(ledger.describe().contains("state.json"));
    }
}
